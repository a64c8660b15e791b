//! Pool-owning front door for embedders.
//!
//! [`SchedulingEngine`] bundles the connection pool and the change observer
//! and exposes every operation of this crate as a method, checking a
//! connection out per call. Callers that manage their own pool can keep
//! using the free functions directly.

use std::sync::Arc;

use chrono_tz::Tz;
use tutorium_core::config::Settings;
use tutorium_db::db::DbProvider;
use tutorium_db::db::connection::{DbPool, create_pool};
use tutorium_db::model::configuration::CourseScheduleConfiguration;
use tutorium_db::model::free_period::FreePeriod;
use tutorium_db::model::session::Session;
use uuid::Uuid;

use crate::configuration::{ConfigurationPatch, CreateConfigurationContext};
use crate::error::ServiceResult;
use crate::free_period::CreateFreePeriodContext;
use crate::observer::{LoggingObserver, ScheduleChangeObserver};
use crate::schedule::{CreateScheduleContext, SchedulePatch, ScheduleWithSessions};
use crate::session::CreateSessionContext;

pub struct SchedulingEngine {
    pool: DbPool,
    observer: Arc<dyn ScheduleChangeObserver>,
}

impl SchedulingEngine {
    /// ## Summary
    /// Creates the connection pool from the loaded settings. Changes are
    /// announced through [`LoggingObserver`] until [`Self::with_observer`]
    /// swaps in another implementation.
    ///
    /// ## Errors
    /// Returns an error if the pool cannot be created with the configured
    /// database URL.
    pub async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        let pool = create_pool(
            &settings.database.url,
            u32::from(settings.database.max_connections),
        )
        .await?;

        Ok(Self {
            pool,
            observer: Arc::new(LoggingObserver),
        })
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScheduleChangeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// ## Errors
    /// See [`crate::schedule::create_schedule`].
    pub async fn create_schedule(
        &self,
        ctx: &CreateScheduleContext,
    ) -> ServiceResult<ScheduleWithSessions> {
        let mut conn = self.pool.get_connection().await?;
        crate::schedule::create_schedule(&mut conn, self.observer.as_ref(), ctx).await
    }

    /// ## Errors
    /// See [`crate::schedule::update_schedule`].
    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        patch: &SchedulePatch,
    ) -> ServiceResult<ScheduleWithSessions> {
        let mut conn = self.pool.get_connection().await?;
        crate::schedule::update_schedule(&mut conn, self.observer.as_ref(), schedule_id, patch)
            .await
    }

    /// ## Errors
    /// See [`crate::schedule::delete_schedule`].
    pub async fn delete_schedule(&self, schedule_id: Uuid) -> ServiceResult<usize> {
        let mut conn = self.pool.get_connection().await?;
        crate::schedule::delete_schedule(&mut conn, self.observer.as_ref(), schedule_id).await
    }

    /// ## Errors
    /// See [`crate::session::create_session`].
    pub async fn create_session(&self, ctx: &CreateSessionContext) -> ServiceResult<Session> {
        let mut conn = self.pool.get_connection().await?;
        crate::session::create_session(&mut conn, self.observer.as_ref(), ctx).await
    }

    /// ## Errors
    /// See [`crate::session::cancel_session`].
    pub async fn cancel_session(
        &self,
        session_id: Uuid,
        explanation: &str,
    ) -> ServiceResult<Session> {
        let mut conn = self.pool.get_connection().await?;
        crate::session::cancel_session(&mut conn, self.observer.as_ref(), session_id, explanation)
            .await
    }

    /// ## Errors
    /// See [`crate::session::reactivate_session`].
    pub async fn reactivate_session(&self, session_id: Uuid) -> ServiceResult<Session> {
        let mut conn = self.pool.get_connection().await?;
        crate::session::reactivate_session(&mut conn, self.observer.as_ref(), session_id).await
    }

    /// ## Errors
    /// See [`crate::session::delete_session`].
    pub async fn delete_session(&self, session_id: Uuid) -> ServiceResult<()> {
        let mut conn = self.pool.get_connection().await?;
        crate::session::delete_session(&mut conn, self.observer.as_ref(), session_id).await
    }

    /// ## Errors
    /// See [`crate::free_period::create_free_period`].
    pub async fn create_free_period(
        &self,
        ctx: &CreateFreePeriodContext,
    ) -> ServiceResult<FreePeriod> {
        let mut conn = self.pool.get_connection().await?;
        crate::free_period::create_free_period(&mut conn, self.observer.as_ref(), ctx).await
    }

    /// ## Errors
    /// See [`crate::free_period::delete_free_period`].
    pub async fn delete_free_period(&self, free_period_id: Uuid) -> ServiceResult<()> {
        let mut conn = self.pool.get_connection().await?;
        crate::free_period::delete_free_period(&mut conn, self.observer.as_ref(), free_period_id)
            .await
    }

    /// ## Errors
    /// See [`crate::configuration::create_course_configuration`].
    pub async fn create_course_configuration(
        &self,
        ctx: &CreateConfigurationContext,
    ) -> ServiceResult<CourseScheduleConfiguration> {
        let mut conn = self.pool.get_connection().await?;
        crate::configuration::create_course_configuration(&mut conn, ctx).await
    }

    /// ## Errors
    /// See [`crate::configuration::update_course_configuration`].
    pub async fn update_course_configuration(
        &self,
        course_id: Uuid,
        patch: &ConfigurationPatch,
    ) -> ServiceResult<CourseScheduleConfiguration> {
        let mut conn = self.pool.get_connection().await?;
        crate::configuration::update_course_configuration(
            &mut conn,
            self.observer.as_ref(),
            course_id,
            patch,
        )
        .await
    }

    /// ## Errors
    /// See [`crate::configuration::effective_timezone`].
    pub async fn effective_timezone(&self, course_id: Uuid) -> ServiceResult<Tz> {
        let mut conn = self.pool.get_connection().await?;
        crate::configuration::effective_timezone(&mut conn, course_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_shareable<T: Send + Sync>() {}

    #[test_log::test]
    fn test_engine_is_shareable_across_tasks() {
        assert_shareable::<SchedulingEngine>();
    }
}

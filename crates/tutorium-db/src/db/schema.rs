//! Hand-maintained diesel schema for the scheduling tables.
//!
//! Kept in sync with the SQL in `migrations/`.

diesel::table! {
    tutorial_group (id) {
        id -> Uuid,
        course_id -> Uuid,
        title -> Text,
        capacity -> Nullable<Int4>,
    }
}

diesel::table! {
    tutorial_group_schedule (id) {
        id -> Uuid,
        tutorial_group_id -> Uuid,
        day_of_week -> Int2,
        start_time -> Time,
        end_time -> Time,
        location -> Text,
        valid_from -> Date,
        valid_to -> Date,
        repetition_frequency -> Int4,
    }
}

diesel::table! {
    tutorial_group_session (id) {
        id -> Uuid,
        tutorial_group_id -> Uuid,
        schedule_id -> Nullable<Uuid>,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        location -> Text,
        status -> Text,
        status_explanation -> Nullable<Text>,
    }
}

diesel::table! {
    course_schedule_configuration (id) {
        id -> Uuid,
        course_id -> Uuid,
        time_zone -> Text,
        period_start -> Date,
        period_end -> Date,
    }
}

diesel::table! {
    free_period (id) {
        id -> Uuid,
        configuration_id -> Uuid,
        period_start -> Timestamptz,
        period_end -> Timestamptz,
        reason -> Text,
    }
}

diesel::joinable!(tutorial_group_schedule -> tutorial_group (tutorial_group_id));
diesel::joinable!(tutorial_group_session -> tutorial_group (tutorial_group_id));
diesel::joinable!(free_period -> course_schedule_configuration (configuration_id));

diesel::allow_tables_to_appear_in_same_query!(
    tutorial_group,
    tutorial_group_schedule,
    tutorial_group_session,
    course_schedule_configuration,
    free_period,
);

mod helpers;
mod profile;
mod progress;
mod reminder;
mod session;

pub(crate) use profile::{ProfileInit, ProfileUpdate, cmd_profile_init, cmd_profile_set, cmd_profile_show};
pub(crate) use progress::{
    MealInput, cmd_progress_activity, cmd_progress_history, cmd_progress_meal, cmd_progress_show,
    cmd_progress_water,
};
pub(crate) use reminder::{
    NewReminder, cmd_reminder_add, cmd_reminder_list, cmd_reminder_remove, cmd_reminder_toggle,
};
pub(crate) use session::{cmd_login, cmd_logout, cmd_whoami};

pub mod notifier;
pub mod reminders;
pub mod schedule;
pub mod weather;

pub use notifier::{DesktopNotifier, Notification, NotificationCenter, NotificationPayload, Notifier};
pub use reminders::{register_reminders, Reminders};
pub use schedule::{next_occurrence, spawn_daily, Clock, DailyTime, SystemClock};
pub use weather::{weather_code_to_text, OpenMeteoClient, WeatherCache, WeatherSource, OPEN_METEO_URL};

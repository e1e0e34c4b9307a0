use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::settings::ReminderSettings;

use super::notifier::{NotificationCenter, NotificationPayload};
use super::schedule::{spawn_daily, Clock, DailyTime};
use super::weather::WeatherCache;

pub const LUNCH_TITLE: &str = "Lunch reminder";
pub const LUNCH_BODY: &str = "It's 12:00. Time to eat or take a break.";
pub const CHECKOUT_TITLE: &str = "Time to head home~";
pub const CHECKOUT_BODY: &str = "It's 18:00. Time to wrap up for the day!";

pub fn checkout_body(weather: Option<&str>) -> String {
    match weather {
        Some(summary) => format!("{CHECKOUT_BODY}\n{summary}"),
        None => CHECKOUT_BODY.to_string(),
    }
}

/// Background tasks owned by the reminder schedule.
#[derive(Default)]
pub struct Reminders {
    tasks: Vec<JoinHandle<()>>,
}

impl Reminders {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Reminders {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Parses a configured reminder time; an unreadable one disables only that
/// reminder.
fn reminder_time(name: &str, text: &str) -> Option<DailyTime> {
    match DailyTime::parse(text) {
        Ok(at) => Some(at),
        Err(err) => {
            warn!("Skipping {name}: {err:#}");
            None
        }
    }
}

pub fn register_reminders(
    runtime: &Handle,
    clock: Arc<dyn Clock>,
    center: Arc<NotificationCenter>,
    weather: Arc<WeatherCache>,
    settings: &ReminderSettings,
    weather_refresh: Duration,
) -> Reminders {
    let mut reminders = Reminders::default();

    let lunch = settings
        .lunch_enabled
        .then(|| reminder_time("lunch reminder", &settings.lunch_time))
        .flatten();
    if let Some(at) = lunch {
        let center = Arc::clone(&center);
        reminders.tasks.push(spawn_daily(
            runtime,
            Arc::clone(&clock),
            "lunch reminder",
            at,
            move || {
                let center = Arc::clone(&center);
                async move {
                    center.send(NotificationPayload {
                        title: Some(LUNCH_TITLE.into()),
                        body: Some(LUNCH_BODY.into()),
                        ..NotificationPayload::default()
                    });
                }
            },
        ));
    }

    let checkout = settings
        .checkout_enabled
        .then(|| reminder_time("checkout reminder", &settings.checkout_time))
        .flatten();
    if let Some(at) = checkout {
        reminders
            .tasks
            .push(weather.spawn_refresh_loop(runtime, weather_refresh));
        let center = Arc::clone(&center);
        reminders.tasks.push(spawn_daily(
            runtime,
            clock,
            "checkout reminder",
            at,
            move || {
                let center = Arc::clone(&center);
                let weather = Arc::clone(&weather);
                async move {
                    let summary = weather.refresh().await;
                    center.send(NotificationPayload {
                        title: Some(CHECKOUT_TITLE.into()),
                        body: Some(checkout_body(summary.as_deref())),
                        ..NotificationPayload::default()
                    });
                }
            },
        ));
    }

    info!("Registered {} reminder task(s)", reminders.len());
    reminders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::notifier::tests::RecordingNotifier;
    use crate::notify::schedule::tests::{local, TestClock};
    use crate::notify::weather::tests::StaticWeather;

    fn center(notifier: &Arc<RecordingNotifier>) -> Arc<NotificationCenter> {
        Arc::new(NotificationCenter::new(notifier.clone(), "Flabba", None))
    }

    #[test]
    fn checkout_body_appends_weather_when_known() {
        assert_eq!(checkout_body(None), CHECKOUT_BODY);
        assert_eq!(
            checkout_body(Some("Hsinchu 28°C Clear")),
            format!("{CHECKOUT_BODY}\nHsinchu 28°C Clear")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn both_reminders_fire_on_their_day() {
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(TestClock::starting_at(local(2026, 1, 15, 9, 0)));
        let weather = Arc::new(WeatherCache::new(Arc::new(StaticWeather(Some(
            "Hsinchu 22°C Clear",
        )))));

        let _reminders = register_reminders(
            &Handle::current(),
            clock,
            center(&notifier),
            weather,
            &ReminderSettings::default(),
            Duration::from_secs(30 * 60),
        );

        tokio::time::sleep(Duration::from_secs(10 * 3600)).await;

        let shown = notifier.shown();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].title, LUNCH_TITLE);
        assert_eq!(shown[0].body, LUNCH_BODY);
        assert_eq!(shown[1].title, CHECKOUT_TITLE);
        assert_eq!(shown[1].body, format!("{CHECKOUT_BODY}\nHsinchu 22°C Clear"));
    }

    #[tokio::test(start_paused = true)]
    async fn checkout_without_weather_uses_plain_body() {
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(TestClock::starting_at(local(2026, 1, 15, 17, 0)));
        let weather = Arc::new(WeatherCache::new(Arc::new(StaticWeather(None))));
        let settings = ReminderSettings {
            lunch_enabled: false,
            ..ReminderSettings::default()
        };

        let reminders = register_reminders(
            &Handle::current(),
            clock,
            center(&notifier),
            weather,
            &settings,
            Duration::from_secs(30 * 60),
        );
        assert_eq!(reminders.len(), 2);

        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;

        let shown = notifier.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].body, CHECKOUT_BODY);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_time_skips_only_that_reminder() {
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(TestClock::starting_at(local(2026, 1, 15, 9, 0)));
        let settings = ReminderSettings {
            lunch_time: "25:00".into(),
            ..ReminderSettings::default()
        };

        let reminders = register_reminders(
            &Handle::current(),
            clock,
            center(&notifier),
            Arc::new(WeatherCache::new(Arc::new(StaticWeather(None)))),
            &settings,
            Duration::from_secs(30 * 60),
        );
        // Weather refresh loop plus the checkout reminder.
        assert_eq!(reminders.len(), 2);

        tokio::time::sleep(Duration::from_secs(10 * 3600)).await;

        let shown = notifier.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, CHECKOUT_TITLE);
    }

    #[tokio::test]
    async fn nothing_is_registered_when_every_time_is_unreadable() {
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = ReminderSettings {
            lunch_time: "noon".into(),
            checkout_time: "18:75".into(),
            ..ReminderSettings::default()
        };
        let reminders = register_reminders(
            &Handle::current(),
            Arc::new(crate::notify::SystemClock),
            center(&notifier),
            Arc::new(WeatherCache::new(Arc::new(StaticWeather(None)))),
            &settings,
            Duration::from_secs(60),
        );
        assert_eq!(reminders.len(), 0);
    }
}

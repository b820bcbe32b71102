//! Fixed-interval polling of a set of subjects

use crate::collaborators::{CropContextProvider, WeatherSource};
use crate::config::SchedulerConfig;
use crate::driver::{CycleOutcome, Pipeline};
use alerting::CooldownStore;
use chrono::Utc;
use field_model::{AlertOutput, SubjectId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Refreshes every subject on each tick and forwards completed outputs
pub struct PollScheduler<S, C, W> {
    pipeline: Arc<Pipeline<S>>,
    crops: Arc<C>,
    weather: Arc<W>,
    subjects: Vec<SubjectId>,
    poll_interval: Duration,
    purge_interval: Duration,
}

impl<S, C, W> PollScheduler<S, C, W>
where
    S: CooldownStore + 'static,
    C: CropContextProvider + 'static,
    W: WeatherSource + 'static,
{
    pub fn new(
        pipeline: Arc<Pipeline<S>>,
        crops: Arc<C>,
        weather: Arc<W>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            pipeline,
            crops,
            weather,
            subjects: config.subjects.iter().map(|s| SubjectId::new(s.as_str())).collect(),
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            purge_interval: Duration::from_secs(config.purge_interval_secs.max(1)),
        }
    }

    /// Poll until the receiving side of `outputs` is dropped
    pub async fn run(self, outputs: mpsc::Sender<(SubjectId, AlertOutput)>) {
        info!(
            "Starting poll scheduler: {} subjects every {:?}",
            self.subjects.len(),
            self.poll_interval
        );
        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut purge = interval(self.purge_interval);
        purge.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    if outputs.is_closed() {
                        break;
                    }
                    let completed = self.tick(&outputs).await;
                    debug!("Poll tick completed {} cycles", completed);
                }
                _ = purge.tick() => {
                    if let Err(e) = self.pipeline.purge_cooldowns(Utc::now()).await {
                        warn!("Cooldown purge failed: {}", e);
                    }
                }
            }
        }
        info!("Poll scheduler stopped");
    }

    /// Run one cycle per subject concurrently; returns how many outputs
    /// were forwarded
    pub async fn tick(&self, outputs: &mpsc::Sender<(SubjectId, AlertOutput)>) -> usize {
        let mut tasks = JoinSet::new();
        for subject in &self.subjects {
            let subject = subject.clone();
            let pipeline = Arc::clone(&self.pipeline);
            let crops = Arc::clone(&self.crops);
            let weather = Arc::clone(&self.weather);
            tasks.spawn(async move {
                let result = pipeline
                    .refresh(&subject, crops.as_ref(), weather.as_ref(), Utc::now())
                    .await;
                (subject, result)
            });
        }

        let mut forwarded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((subject, Ok(CycleOutcome::Completed(output)))) => {
                    if outputs.send((subject, output)).await.is_ok() {
                        forwarded += 1;
                    }
                }
                Ok((subject, Ok(CycleOutcome::Superseded))) => {
                    debug!("Poll cycle for {} superseded", subject);
                }
                Ok((subject, Err(e))) => warn!("Poll cycle for {} failed: {}", subject, e),
                Err(e) => error!("Poll task failed: {}", e),
            }
        }
        forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::UpstreamError;
    use alerting::InMemoryCooldownStore;
    use chrono::NaiveDate;
    use field_model::{ForecastDay, Location, Situation, WeatherReadings, WeatherSnapshot};

    struct Crops;

    impl CropContextProvider for Crops {
        async fn get_crop_context(&self, subject: &SubjectId) -> Result<Situation, UpstreamError> {
            if subject.as_str().starts_with("field") {
                Ok(Situation::new(
                    subject.clone(),
                    Location::new(12.9, 77.6),
                    NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
                ))
            } else {
                Err(UpstreamError::UnknownSubject(subject.clone()))
            }
        }
    }

    struct Windy;

    impl WeatherSource for Windy {
        async fn get_weather(
            &self,
            _location: &Location,
        ) -> Result<(WeatherSnapshot, Vec<ForecastDay>), UpstreamError> {
            let readings = WeatherReadings {
                temperature: Some(22.0),
                wind_speed: Some(75.0),
                ..Default::default()
            };
            Ok((WeatherSnapshot::new(readings, Utc::now()), Vec::new()))
        }
    }

    fn scheduler(subjects: &[&str]) -> PollScheduler<InMemoryCooldownStore, Crops, Windy> {
        let config = EngineConfig::default();
        let pipeline = Pipeline::new(&config, None, InMemoryCooldownStore::new()).unwrap();
        let scheduler_config = SchedulerConfig {
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            poll_interval_secs: 60,
            ..SchedulerConfig::default()
        };
        PollScheduler::new(Arc::new(pipeline), Arc::new(Crops), Arc::new(Windy), &scheduler_config)
    }

    #[tokio::test]
    async fn test_tick_forwards_completed_cycles() {
        let scheduler = scheduler(&["field-1", "field-2", "unknown"]);
        let (tx, mut rx) = mpsc::channel(8);

        assert_eq!(scheduler.tick(&tx).await, 2);
        let mut subjects = Vec::new();
        while let Ok((subject, output)) = rx.try_recv() {
            assert_eq!(output.risk_alerts[0].message, "Strong winds (75.0 km/h) may damage crops and affect spraying");
            subjects.push(subject.to_string());
        }
        subjects.sort();
        assert_eq!(subjects, vec!["field-1", "field-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_when_receiver_dropped() {
        let scheduler = scheduler(&["field-1"]);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(scheduler.run(tx));

        let (_, first) = rx.recv().await.unwrap();
        assert_eq!(first.risk_alerts.len(), 1);

        // Second poll is inside the cooldown window: normal conditions
        let (_, second) = rx.recv().await.unwrap();
        assert_eq!(second.risk_alerts[0].message, "No significant weather risks. Conditions are normal.");

        drop(rx);
        tokio::time::timeout(Duration::from_secs(600), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

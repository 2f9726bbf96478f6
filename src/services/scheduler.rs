use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, MissedTickBehavior};

use super::generator::ContentGenerator;
use super::topics::{sample_keywords, sample_target, sample_topics};
use super::trends::DailyTrendManager;
use crate::config::GenerationConfig;
use crate::error::{AppError, Result};
use crate::models::{GenerationOutcome, TrendRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CycleReport {
    /// Another scheduled cycle was still in progress.
    AlreadyRunning,
    TargetReached {
        date: NaiveDate,
        target: u32,
        generated: u32,
    },
    Completed {
        date: NaiveDate,
        target: u32,
        planned: u32,
        outcome: GenerationOutcome,
    },
}

struct PlannedPost {
    topic: String,
    keywords: Vec<String>,
}

struct Timer {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct Inner {
    settings: GenerationConfig,
    trends: DailyTrendManager,
    generator: ContentGenerator,
    state: Mutex<CycleState>,
    timer: Mutex<Option<Timer>>,
}

/// Drives daily post generation, either on its own timer or on demand.
///
/// Cloning is cheap and every clone controls the same timer. Generation is
/// strictly sequential within a run, with a pacing delay between provider
/// calls.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        settings: GenerationConfig,
        trends: DailyTrendManager,
        generator: ContentGenerator,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                trends,
                generator,
                state: Mutex::new(CycleState::Idle),
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &GenerationConfig {
        &self.inner.settings
    }

    pub fn trends(&self) -> &DailyTrendManager {
        &self.inner.trends
    }

    pub fn state(&self) -> CycleState {
        *lock(&self.inner.state)
    }

    pub fn is_started(&self) -> bool {
        lock(&self.inner.timer).is_some()
    }

    /// Spawns the recurring timer. Returns false if it is already running.
    pub fn start(&self) -> bool {
        let mut timer = lock(&self.inner.timer);
        if timer.is_some() {
            tracing::warn!("Content scheduler already started");
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let this = self.clone();
        let task = tokio::spawn(async move { this.run_timer(shutdown_rx).await });
        *timer = Some(Timer { shutdown, task });

        tracing::info!(
            "Content scheduler started (every {}h, first run {})",
            self.inner.settings.interval_hours,
            if self.inner.settings.run_on_start {
                "now"
            } else {
                "after one interval"
            }
        );
        true
    }

    /// Stops future ticks. A cycle already in progress runs to completion;
    /// await the returned handle to wait for it.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        let timer = lock(&self.inner.timer).take()?;
        let _ = timer.shutdown.send(true);
        tracing::info!("Content scheduler stopping");
        Some(timer.task)
    }

    async fn run_timer(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.inner.settings.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.inner.settings.run_on_start {
            // The first tick of an interval completes immediately.
            ticker.tick().await;
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            match self.run_scheduled_cycle().await {
                Ok(report) => log_report(&report),
                Err(e) => tracing::error!("Scheduled content cycle aborted: {}", e),
            }
        }

        tracing::info!("Content scheduler stopped");
    }

    /// One scheduled cycle: make sure today's trends exist, then top the day
    /// up to a randomized target. Only a trend-analysis or commit failure is
    /// an error; individual post failures are tallied.
    pub async fn run_scheduled_cycle(&self) -> Result<CycleReport> {
        let Some(_running) = RunningGuard::acquire(&self.inner.state) else {
            tracing::info!("Scheduled content cycle already running, skipping");
            return Ok(CycleReport::AlreadyRunning);
        };

        let target = self.sample_target();
        let record = self.inner.trends.ensure_today().await?;

        if record.generated_posts >= target {
            return Ok(CycleReport::TargetReached {
                date: record.date,
                target,
                generated: record.generated_posts,
            });
        }

        let planned = target - record.generated_posts;
        tracing::info!(
            "Generating {} posts for {} ({} of {} already attempted)",
            planned,
            record.date,
            record.generated_posts,
            target
        );

        let outcome = self
            .generate_batch(&record, planned, self.inner.settings.scheduled_delay())
            .await;
        self.inner.trends.record_outcome(record.date, &outcome).await?;

        Ok(CycleReport::Completed {
            date: record.date,
            target,
            planned,
            outcome,
        })
    }

    /// Admin burst of `count` posts. Ignores the daily target and the timer;
    /// whether the tally is committed to today's counters is a setting.
    pub async fn run_now(&self, count: u32) -> Result<GenerationOutcome> {
        let max = self.inner.settings.max_manual_posts;
        if count == 0 || count > max {
            return Err(AppError::Validation(format!(
                "count must be between 1 and {}, got {}",
                max, count
            )));
        }

        let record = self.inner.trends.ensure_today().await?;
        tracing::info!("Manual run: generating {} posts for {}", count, record.date);

        let mut outcome = self
            .generate_batch(&record, count, self.inner.settings.manual_delay())
            .await;

        if self.inner.settings.manual_counts_toward_daily_target {
            self.commit_manual_run(record.date, &mut outcome).await;
        }

        tracing::info!(
            "Manual run finished: {} succeeded, {} failed",
            outcome.success,
            outcome.failed
        );
        Ok(outcome)
    }

    /// The posts are already stored, so a failed commit is reported in the
    /// outcome rather than failing the whole run.
    async fn commit_manual_run(&self, date: NaiveDate, outcome: &mut GenerationOutcome) {
        if let Err(e) = self.inner.trends.record_outcome(date, outcome).await {
            tracing::error!("Failed to record manual run for {}: {}", date, e);
            outcome
                .errors
                .push(format!("Failed to record manual run for {}: {}", date, e));
        }
    }

    /// Re-runs trend analysis for today, replacing the stored keywords.
    pub async fn analyze_now(&self) -> Result<TrendRecord> {
        self.inner.trends.refresh_today().await
    }

    fn sample_target(&self) -> u32 {
        let settings = &self.inner.settings;
        sample_target(
            &mut rand::rng(),
            settings.daily_target_min,
            settings.daily_target_max,
        )
    }

    fn plan(&self, record: &TrendRecord, count: u32) -> Vec<PlannedPost> {
        let settings = &self.inner.settings;
        let mut rng = rand::rng();
        sample_topics(&mut rng, &settings.topics, count as usize)
            .into_iter()
            .map(|topic| PlannedPost {
                topic,
                keywords: sample_keywords(&mut rng, &record.trends, settings.max_keywords_per_post),
            })
            .collect()
    }

    async fn generate_batch(
        &self,
        record: &TrendRecord,
        count: u32,
        delay: Duration,
    ) -> GenerationOutcome {
        let plan = self.plan(record, count);
        let mut outcome = GenerationOutcome::default();

        for (index, planned) in plan.into_iter().enumerate() {
            if index > 0 {
                sleep(delay).await;
            }

            match self
                .inner
                .generator
                .generate_one(&planned.topic, record, planned.keywords)
                .await
            {
                Ok(_) => outcome.record_success(),
                Err(e) => {
                    let message =
                        format!("Failed to generate post for topic \"{}\": {}", planned.topic, e);
                    tracing::warn!("{}", message);
                    outcome.record_failure(message);
                }
            }
        }

        outcome
    }
}

fn log_report(report: &CycleReport) {
    match report {
        CycleReport::AlreadyRunning => {}
        CycleReport::TargetReached {
            date,
            target,
            generated,
        } => tracing::info!(
            "Daily target already met for {} ({}/{}), nothing to do",
            date,
            generated,
            target
        ),
        CycleReport::Completed {
            date, outcome, ..
        } => tracing::info!(
            "Scheduled cycle for {} finished: {} succeeded, {} failed",
            date,
            outcome.success,
            outcome.failed
        ),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds `Running` for the duration of a scheduled cycle.
struct RunningGuard<'a> {
    state: &'a Mutex<CycleState>,
}

impl<'a> RunningGuard<'a> {
    fn acquire(state: &'a Mutex<CycleState>) -> Option<Self> {
        let mut current = lock(state);
        if *current == CycleState::Running {
            return None;
        }
        *current = CycleState::Running;
        Some(Self { state })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = CycleState::Idle;
    }
}

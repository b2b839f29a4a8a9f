use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use super::orchestrator::{GeneratedPost, GenerationOutcome, Orchestrator};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{AgentConfig, ScheduleTime};

/// What asked for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// The in-process daily job.
    Scheduled,
    /// The secret-gated cron endpoint.
    External,
    /// An admin pressing "generate now". Ignores the once-a-day limit.
    Manual,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub trigger: Trigger,
    /// True when a guard stopped the run before it started.
    pub skipped: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<GeneratedPost>,
}

impl RunReport {
    fn skipped(trigger: Trigger, message: &str) -> Self {
        Self {
            success: false,
            trigger,
            skipped: true,
            message: message.to_string(),
            post: None,
        }
    }

    fn finished(trigger: Trigger, message: String, post: Option<GeneratedPost>) -> Self {
        Self {
            success: post.is_some(),
            trigger,
            skipped: false,
            message,
            post,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub is_enabled: bool,
    pub schedule_time: ScheduleTime,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<FixedOffset>>,
    pub is_running: bool,
    pub is_scheduled: bool,
}

#[derive(Default)]
struct CronState {
    cron: Option<JobScheduler>,
    job: Option<Uuid>,
}

/// Fires the orchestrator once a day and serializes every run through one flag.
pub struct Scheduler {
    repository: Arc<Repository>,
    orchestrator: Arc<Orchestrator>,
    zone: FixedOffset,
    defaults: AgentConfig,
    running: AtomicBool,
    state: Mutex<CronState>,
}

/// Holds the running flag; releases it on drop.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Scheduler {
    /// `defaults` seed the stored agent config the first time it is read.
    pub fn new(
        repository: Arc<Repository>,
        orchestrator: Arc<Orchestrator>,
        zone: FixedOffset,
        defaults: AgentConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            repository,
            orchestrator,
            zone,
            defaults,
            running: AtomicBool::new(false),
            state: Mutex::new(CronState::default()),
        })
    }

    pub async fn config(&self) -> Result<AgentConfig> {
        self.repository
            .ensure_agent_config(self.defaults.clone())
            .await
    }

    /// Schedules the daily job if the stored config has it enabled.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let config = self.config().await?;
        if !config.is_enabled {
            tracing::info!("Automatic generation is disabled");
            return Ok(());
        }
        self.schedule(config.schedule_time).await
    }

    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if let (Some(cron), Some(job)) = (&state.cron, state.job) {
            cron.remove(&job).await.map_err(scheduler_error)?;
            tracing::info!("Daily generation job removed");
        }
        state.job = None;
        Ok(())
    }

    /// Drops the current job and schedules a fresh one from the stored config.
    pub async fn restart(self: &Arc<Self>) -> Result<()> {
        self.stop().await?;
        self.start().await
    }

    /// Persists the new settings, then rebuilds the daily job to match.
    pub async fn update_config(
        self: &Arc<Self>,
        is_enabled: Option<bool>,
        schedule_time: Option<&str>,
    ) -> Result<AgentConfig> {
        let schedule_time = schedule_time.map(str::parse::<ScheduleTime>).transpose()?;
        let current = self.config().await?;

        let is_enabled = is_enabled.unwrap_or(current.is_enabled);
        let schedule_time = schedule_time.unwrap_or(current.schedule_time);
        self.repository
            .update_agent_config(is_enabled, schedule_time)
            .await?;
        tracing::info!(
            "Agent config updated: enabled={}, time={}",
            is_enabled,
            schedule_time
        );

        self.restart().await?;
        self.config().await
    }

    pub async fn status(&self) -> Result<SchedulerStatus> {
        let config = self.config().await?;
        let is_scheduled = self.state.lock().await.job.is_some();
        let next_run = if config.is_enabled && is_scheduled {
            next_run_after(Utc::now().with_timezone(&self.zone), config.schedule_time)
        } else {
            None
        };

        Ok(SchedulerStatus {
            is_enabled: config.is_enabled,
            schedule_time: config.schedule_time,
            last_run: config.last_run,
            next_run,
            is_running: self.running.load(Ordering::Acquire),
            is_scheduled,
        })
    }

    /// Runs one generation unless another is in flight. Scheduled and external runs
    /// also stop when the agent is disabled or already ran today.
    pub async fn run_now(&self, trigger: Trigger) -> RunReport {
        let Some(_guard) = RunGuard::claim(&self.running) else {
            tracing::info!("Generation already in progress, skipping {:?} run", trigger);
            return RunReport::skipped(trigger, "generation already in progress");
        };

        if trigger != Trigger::Manual {
            let config = match self.config().await {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("Could not read agent config: {}", e);
                    return RunReport::finished(trigger, e.to_string(), None);
                }
            };
            if !config.is_enabled {
                return RunReport::skipped(trigger, "automatic generation is disabled");
            }
            if config
                .last_run
                .is_some_and(|last| already_ran_today(last, Utc::now(), self.zone))
            {
                tracing::info!("Already generated today, skipping {:?} run", trigger);
                return RunReport::skipped(trigger, "already ran today");
            }
        }

        tracing::info!("Starting {:?} generation run", trigger);
        let report = match self.orchestrator.generate_next().await {
            Ok(GenerationOutcome::Created(post)) => {
                RunReport::finished(trigger, format!("created '{}'", post.title), Some(post))
            }
            Ok(GenerationOutcome::NoTopics) => RunReport::finished(
                trigger,
                "no unused topics, add new topics or reset the queue".to_string(),
                None,
            ),
            Err(e) => {
                tracing::error!("Generation run failed: {}", e);
                RunReport::finished(trigger, e.to_string(), None)
            }
        };

        if let Err(e) = self.repository.set_last_run(Utc::now()).await {
            tracing::warn!("Could not record last run: {}", e);
        }
        report
    }

    async fn schedule(self: &Arc<Self>, time: ScheduleTime) -> Result<()> {
        let mut state = self.state.lock().await;

        let cron = match &state.cron {
            Some(cron) => cron.clone(),
            None => {
                let cron = JobScheduler::new().await.map_err(scheduler_error)?;
                cron.start().await.map_err(scheduler_error)?;
                state.cron = Some(cron.clone());
                cron
            }
        };

        if let Some(job) = state.job.take() {
            cron.remove(&job).await.map_err(scheduler_error)?;
        }

        let scheduler: Weak<Self> = Arc::downgrade(self);
        let expression = time.cron_expression();
        let job = Job::new_async_tz(expression.as_str(), self.zone, move |_id, _lock| {
            let scheduler = scheduler.clone();
            Box::pin(async move {
                if let Some(scheduler) = scheduler.upgrade() {
                    let report = scheduler.run_now(Trigger::Scheduled).await;
                    tracing::info!("Scheduled run finished: {}", report.message);
                }
            })
        })
        .map_err(scheduler_error)?;

        state.job = Some(cron.add(job).await.map_err(scheduler_error)?);
        tracing::info!(
            "Daily generation scheduled at {} (UTC{})",
            time,
            self.zone
        );
        Ok(())
    }
}

fn scheduler_error(e: impl std::fmt::Display) -> AppError {
    AppError::Scheduler(e.to_string())
}

/// First occurrence of `time` strictly after `now`, in `now`'s offset.
pub fn next_run_after(now: DateTime<FixedOffset>, time: ScheduleTime) -> Option<DateTime<FixedOffset>> {
    let today = now
        .date_naive()
        .and_hms_opt(time.hour, time.minute, 0)?
        .and_local_timezone(*now.offset())
        .single()?;
    if today > now {
        Some(today)
    } else {
        Some(today + Duration::days(1))
    }
}

/// Whether `last_run` falls on the same calendar day as `now` in `zone`.
pub fn already_ran_today(last_run: DateTime<Utc>, now: DateTime<Utc>, zone: FixedOffset) -> bool {
    last_run.with_timezone(&zone).date_naive() == now.with_timezone(&zone).date_naive()
}

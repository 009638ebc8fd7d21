use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Next multiple of `period_minutes` after `now`; with 60 that is the top of
/// the next hour
pub fn next_refresh_boundary(now: DateTime<Utc>, period_minutes: u32) -> DateTime<Utc> {
    let period = TimeDelta::minutes(i64::from(period_minutes.max(1)));
    now.duration_trunc(period).unwrap_or(now) + period
}

/// A single pending wake-up. Arming cancels whatever was pending before.
pub struct PointInTimeTimer {
    pending: Option<JoinHandle<()>>,
    fire_tx: mpsc::UnboundedSender<()>,
}

impl PointInTimeTimer {
    pub fn new(fire_tx: mpsc::UnboundedSender<()>) -> Self {
        Self {
            pending: None,
            fire_tx,
        }
    }

    pub fn arm_at(&mut self, at: DateTime<Utc>) {
        self.cancel();
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        let tx = self.fire_tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(());
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PointInTimeTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// [libs/infra/congress-client/src/rate_limiter.rs]
/*!
 * APARATO: INTER-REQUEST RATE LIMITER (ESTRATO L3)
 * RESPONSABILIDAD: Garantiza que dos llamadas consecutivas emitidas por
 * el mismo Fetcher queden separadas por al menos `D_req`.
 */

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

pub struct RateLimiter {
    min_spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_call: Mutex::new(None),
        }
    }

    /// Duerme lo necesario para que la llamada actual respete el
    /// espaciado mínimo desde la última, luego registra el instante de
    /// esta llamada como el nuevo `last_call`.
    pub async fn wait_turn(&self) {
        let mut guard = self.last_call.lock().await;

        if let Some(previous) = *guard {
            let elapsed = previous.elapsed();
            if elapsed < self.min_spacing {
                sleep(self.min_spacing - elapsed).await;
            }
        }

        *guard = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn second_call_waits_out_the_remaining_spacing() {
        let limiter = RateLimiter::new(Duration::from_millis(750));

        let start = Instant::now();
        limiter.wait_turn().await;
        limiter.wait_turn().await;

        assert!(start.elapsed() >= Duration::from_millis(750));
    }
}

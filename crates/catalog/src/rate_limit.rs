//! Rate-limit signal detection for GitHub-style APIs.
//!
//! - Primary quota exhaustion: `403`/`429` with `x-ratelimit-remaining: 0`.
//!   Backoff comes from `retry-after`, else from `x-ratelimit-reset`.
//! - Secondary (abuse detection): `429`, or `403` carrying `retry-after`,
//!   while the primary quota is not exhausted.
//! - A plain `403` without either marker is an authorization failure, not a
//!   rate limit.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::{StatusCode, header::HeaderMap};

const RETRY_AFTER: &str = "retry-after";
const REMAINING: &str = "x-ratelimit-remaining";
const RESET: &str = "x-ratelimit-reset";

/// Backoff assumed when the host signals a limit without saying how long.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSignal {
    pub tier: Tier,
    pub retry_after: Duration,
}

/// Inspect a response for a rate-limit signal. `now_unix` is the current
/// time in seconds, used to turn `x-ratelimit-reset` into a delay.
pub fn classify(status: StatusCode, headers: &HeaderMap, now_unix: u64) -> Option<RateLimitSignal> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let retry_after = header_u64(headers, RETRY_AFTER).map(Duration::from_secs);

    if header_u64(headers, REMAINING) == Some(0) {
        let from_reset = header_u64(headers, RESET)
            .map(|reset| Duration::from_secs(reset.saturating_sub(now_unix)));
        return Some(RateLimitSignal {
            tier: Tier::Primary,
            retry_after: retry_after.or(from_reset).unwrap_or(DEFAULT_BACKOFF),
        });
    }

    if status == StatusCode::TOO_MANY_REQUESTS || retry_after.is_some() {
        return Some(RateLimitSignal {
            tier: Tier::Secondary,
            retry_after: retry_after.unwrap_or(DEFAULT_BACKOFF),
        });
    }

    None
}

/// What to do after a rate-limit signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    RetryAfter(Duration),
    GiveUp,
}

/// A primary signal is retried once after its backoff. Secondary signals and
/// a repeated signal give up. `max_wait` is an optional ceiling on the
/// honoured backoff; `None` waits for whatever the host asks.
pub fn verdict(signal: RateLimitSignal, retried: bool, max_wait: Option<Duration>) -> Verdict {
    if retried || signal.tier == Tier::Secondary {
        return Verdict::GiveUp;
    }
    match max_wait {
        Some(ceiling) if signal.retry_after > ceiling => Verdict::GiveUp,
        _ => Verdict::RetryAfter(signal.retry_after),
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use {super::*, reqwest::header::HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn success_is_never_a_signal() {
        let h = headers(&[(REMAINING, "0")]);
        assert_eq!(classify(StatusCode::OK, &h, 0), None);
    }

    #[test]
    fn exhausted_quota_uses_reset_time() {
        let h = headers(&[(REMAINING, "0"), (RESET, "1000")]);
        let signal = classify(StatusCode::FORBIDDEN, &h, 990).unwrap();
        assert_eq!(signal.tier, Tier::Primary);
        assert_eq!(signal.retry_after, Duration::from_secs(10));
    }

    #[test]
    fn retry_after_wins_over_reset() {
        let h = headers(&[(REMAINING, "0"), (RESET, "1000"), (RETRY_AFTER, "3")]);
        let signal = classify(StatusCode::TOO_MANY_REQUESTS, &h, 0).unwrap();
        assert_eq!(signal.tier, Tier::Primary);
        assert_eq!(signal.retry_after, Duration::from_secs(3));
    }

    #[test]
    fn reset_in_the_past_means_no_wait() {
        let h = headers(&[(REMAINING, "0"), (RESET, "5")]);
        let signal = classify(StatusCode::FORBIDDEN, &h, 100).unwrap();
        assert_eq!(signal.retry_after, Duration::ZERO);
    }

    #[test]
    fn too_many_requests_with_quota_left_is_secondary() {
        let h = headers(&[(REMAINING, "42"), (RETRY_AFTER, "30")]);
        let signal = classify(StatusCode::TOO_MANY_REQUESTS, &h, 0).unwrap();
        assert_eq!(signal.tier, Tier::Secondary);
        assert_eq!(signal.retry_after, Duration::from_secs(30));
    }

    #[test]
    fn plain_forbidden_is_not_a_rate_limit() {
        let h = headers(&[(REMAINING, "42")]);
        assert_eq!(classify(StatusCode::FORBIDDEN, &h, 0), None);
    }

    #[test]
    fn missing_backoff_uses_default() {
        let signal = classify(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), 0).unwrap();
        assert_eq!(signal.retry_after, DEFAULT_BACKOFF);
    }

    #[test]
    fn long_primary_backoff_is_retried_without_ceiling() {
        let h = headers(&[(REMAINING, "0"), (RESET, "1120")]);
        let signal = classify(StatusCode::FORBIDDEN, &h, 1000).unwrap();
        assert_eq!(signal.retry_after, Duration::from_secs(120));
        assert_eq!(
            verdict(signal, false, None),
            Verdict::RetryAfter(Duration::from_secs(120))
        );
        assert_eq!(verdict(signal, true, None), Verdict::GiveUp);
    }

    #[test]
    fn configured_ceiling_caps_primary_backoff() {
        let signal = RateLimitSignal {
            tier: Tier::Primary,
            retry_after: Duration::from_secs(120),
        };
        assert_eq!(
            verdict(signal, false, Some(Duration::from_secs(60))),
            Verdict::GiveUp
        );
        assert_eq!(
            verdict(signal, false, Some(Duration::from_secs(300))),
            Verdict::RetryAfter(Duration::from_secs(120))
        );
    }

    #[test]
    fn secondary_signal_is_never_retried() {
        let signal = RateLimitSignal {
            tier: Tier::Secondary,
            retry_after: Duration::ZERO,
        };
        assert_eq!(verdict(signal, false, None), Verdict::GiveUp);
    }
}

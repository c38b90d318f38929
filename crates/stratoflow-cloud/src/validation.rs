//! Reusable attribute validators

use crate::schema::Validator;
use regex::Regex;
use serde_json::Value;
use std::net::Ipv4Addr;
use std::sync::{Arc, LazyLock};

static HOSTNAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("valid hostname pattern")
});

/// IPv4 CIDR block such as `10.0.0.0/24`
pub fn is_valid_cidr_v4(value: &str) -> bool {
    let Some((addr, prefix)) = value.split_once('/') else {
        return false;
    };
    addr.parse::<Ipv4Addr>().is_ok() && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
}

/// RFC 1123 hostname (dot separated labels)
pub fn is_valid_hostname(value: &str) -> bool {
    !value.is_empty() && value.len() <= 253 && value.split('.').all(|l| HOSTNAME_LABEL.is_match(l))
}

/// `"80"`, `"8000-8080"` or `"all"`
pub fn is_valid_port_range(value: &str) -> bool {
    if value.eq_ignore_ascii_case("all") {
        return true;
    }
    let parse = |s: &str| s.trim().parse::<u16>().ok().filter(|p| *p >= 1);
    match value.split_once('-') {
        Some((start, end)) => matches!((parse(start), parse(end)), (Some(s), Some(e)) if s <= e),
        None => parse(value).is_some(),
    }
}

pub fn cidr_v4() -> Validator {
    string_check(|s| {
        if is_valid_cidr_v4(s) {
            Ok(())
        } else {
            Err(format!("\"{}\" is not a valid IPv4 CIDR block", s))
        }
    })
}

pub fn hostname() -> Validator {
    string_check(|s| {
        if is_valid_hostname(s) {
            Ok(())
        } else {
            Err(format!("\"{}\" is not a valid hostname", s))
        }
    })
}

pub fn port_range() -> Validator {
    string_check(|s| {
        if is_valid_port_range(s) {
            Ok(())
        } else {
            Err(format!(
                "\"{}\" is not a valid port range (expected \"80\", \"8000-8080\" or \"all\")",
                s
            ))
        }
    })
}

pub fn not_empty() -> Validator {
    string_check(|s| {
        if s.trim().is_empty() {
            Err("must not be empty".to_string())
        } else {
            Ok(())
        }
    })
}

/// Duration string accepted by `timeouts` blocks (`30s`, `5m`, `1h30m`)
pub fn duration() -> Validator {
    string_check(|s| {
        stratoflow_core::parse_duration(s)
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
}

/// One of a fixed set of values
pub fn string_in(allowed: &[&str]) -> Validator {
    let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
    string_check(move |s| {
        if allowed.iter().any(|a| a == s) {
            Ok(())
        } else {
            Err(format!("expected one of [{}], got \"{}\"", allowed.join(", "), s))
        }
    })
}

pub fn int_at_least(min: i64) -> Validator {
    int_check(move |n| {
        if n >= min {
            Ok(())
        } else {
            Err(format!("expected a value of at least {}, got {}", min, n))
        }
    })
}

pub fn int_between(min: i64, max: i64) -> Validator {
    int_check(move |n| {
        if (min..=max).contains(&n) {
            Ok(())
        } else {
            Err(format!("expected a value between {} and {}, got {}", min, max, n))
        }
    })
}

pub fn multiple_of(step: i64) -> Validator {
    int_check(move |n| {
        if step != 0 && n % step == 0 {
            Ok(())
        } else {
            Err(format!("expected a multiple of {}, got {}", step, n))
        }
    })
}

fn string_check<F>(check: F) -> Validator
where
    F: Fn(&str) -> std::result::Result<(), String> + Send + Sync + 'static,
{
    Arc::new(move |value: &Value| match value.as_str() {
        Some(s) => check(s),
        None => Err(format!("expected a string, got {}", value)),
    })
}

fn int_check<F>(check: F) -> Validator
where
    F: Fn(i64) -> std::result::Result<(), String> + Send + Sync + 'static,
{
    Arc::new(move |value: &Value| match value.as_i64() {
        Some(n) => check(n),
        None => Err(format!("expected a number, got {}", value)),
    })
}

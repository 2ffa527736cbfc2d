//! Invocations available to the standalone binary.
//!
//! Hosts embedding the library register their own operations; these exist so a
//! plain configuration file can exercise the named-call path.

use super::registry::InvocationRegistry;
use crate::core::Arguments;
use std::thread;
use std::time::Duration;

/// Succeeds without doing anything.
fn noop(_arguments: &Arguments) -> Result<(), String> {
    Ok(())
}

/// `fail {message:...}` always fails.
fn fail(arguments: &Arguments) -> Result<(), String> {
    Err(arguments
        .get("message")
        .cloned()
        .unwrap_or_else(|| "failed on request".to_string()))
}

/// `sleep {seconds:N}` blocks the run for N seconds.
fn sleep(arguments: &Arguments) -> Result<(), String> {
    let raw = arguments
        .get("seconds")
        .ok_or_else(|| "missing argument 'seconds'".to_string())?;
    let seconds: f64 = raw
        .parse()
        .map_err(|_| format!("invalid number of seconds: '{}'", raw))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("invalid number of seconds: '{}'", raw));
    }
    thread::sleep(Duration::from_secs_f64(seconds));
    Ok(())
}

pub fn register_builtins(registry: &mut InvocationRegistry) {
    registry.register("noop", noop);
    registry.register("fail", fail);
    registry.register("sleep", sleep);
}

pub fn builtin_registry() -> InvocationRegistry {
    let mut registry = InvocationRegistry::new();
    register_builtins(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(builtin_registry().names(), vec!["fail", "noop", "sleep"]);
    }

    #[test]
    fn test_fail_uses_message_argument() {
        let registry = builtin_registry();
        let fail = registry.get("fail").unwrap();
        assert_eq!(fail.invoke(&args(&[("message", "nope")])), Err("nope".to_string()));
        assert!(fail.invoke(&Arguments::new()).is_err());
    }

    #[test]
    fn test_sleep_validates_seconds() {
        let registry = builtin_registry();
        let sleep = registry.get("sleep").unwrap();
        assert!(sleep.invoke(&args(&[("seconds", "0")])).is_ok());
        assert!(sleep.invoke(&args(&[("seconds", "soon")])).is_err());
        assert!(sleep.invoke(&args(&[("seconds", "-1")])).is_err());
        assert!(sleep.invoke(&Arguments::new()).is_err());
    }
}

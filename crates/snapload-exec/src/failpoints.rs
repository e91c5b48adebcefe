//! Crash-injection hooks (feature: `failpoints`).
//!
//! With the feature off the macro expands to nothing. With it on, a point
//! panics when its name is listed in `SNAPLOAD_FAILPOINTS` (comma separated),
//! e.g. `SNAPLOAD_FAILPOINTS=before_commit`, or when armed on the current
//! thread with [`arm`].

#[cfg(feature = "failpoints")]
use std::cell::RefCell;

#[cfg(feature = "failpoints")]
thread_local! {
    static ARMED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

#[cfg(feature = "failpoints")]
pub fn is_armed(name: &str) -> bool {
    let local = ARMED.with(|armed| armed.borrow().iter().any(|p| p == name));
    local
        || std::env::var("SNAPLOAD_FAILPOINTS")
            .map(|v| v.split(',').any(|p| p.trim() == name))
            .unwrap_or(false)
}

/// Arms `name` on this thread until the returned guard is dropped.
#[cfg(feature = "failpoints")]
pub fn arm(name: &str) -> ArmedPoint {
    ARMED.with(|armed| armed.borrow_mut().push(name.to_string()));
    ArmedPoint {
        name: name.to_string(),
    }
}

#[cfg(feature = "failpoints")]
#[must_use = "the point is disarmed when this guard drops"]
pub struct ArmedPoint {
    name: String,
}

#[cfg(feature = "failpoints")]
impl Drop for ArmedPoint {
    fn drop(&mut self) {
        ARMED.with(|armed| {
            let mut armed = armed.borrow_mut();
            if let Some(pos) = armed.iter().position(|p| *p == self.name) {
                armed.remove(pos);
            }
        });
    }
}

#[cfg(feature = "failpoints")]
#[macro_export]
macro_rules! fail_point {
    ($name:expr) => {{
        if $crate::failpoints::is_armed($name) {
            panic!("failpoint triggered: {}", $name);
        }
    }};
}

#[cfg(not(feature = "failpoints"))]
#[macro_export]
macro_rules! fail_point {
    ($name:expr) => {{
        let _ = $name;
    }};
}

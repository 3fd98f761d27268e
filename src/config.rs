//! Support for library configuration options

use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// How many days past its first occurrence a recurring event with no explicit
/// end date keeps repeating. The backend leaves such series open-ended, so the
/// client has to pick a horizon somewhere.
/// Feel free to override it when initing this library.
pub static OPEN_SERIES_HORIZON_DAYS: Lazy<Arc<Mutex<i64>>> = Lazy::new(|| Arc::new(Mutex::new(365)));

pub(crate) fn open_series_horizon_days() -> i64 {
    *OPEN_SERIES_HORIZON_DAYS.lock().unwrap(/* never poisoned: lock holders cannot panic */)
}

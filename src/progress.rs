//! Load progress tracking
//!
//! Storage reports every load to a [`LoadObserver`] twice: when the load is
//! dispatched and when its bytes arrived. [`ProgressTracker`] counts both and
//! hands a snapshot to a callback each time.

use std::sync::{Mutex, PoisonError};

use crate::assets::AssetDescriptor;

/// Counts of dispatched and completed loads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub total: usize,
    pub complete: usize,
}

/// A load that finished
#[derive(Debug, Clone, Copy)]
pub struct LoadedAsset<'a> {
    pub descriptor: &'a AssetDescriptor,
    pub data: &'a [u8],
}

/// Receives load lifecycle events from storage
pub trait LoadObserver: Send + Sync {
    /// A load started
    fn dispatched(&self, descriptor: &AssetDescriptor);

    /// A load finished successfully. Failed loads are never reported here.
    fn completed(&self, asset: LoadedAsset<'_>);
}

/// Counts loads and reports each change to a callback
pub struct ProgressTracker<F> {
    state: Mutex<ProgressState>,
    callback: F,
}

impl<F> ProgressTracker<F>
where
    F: Fn(ProgressState, Option<LoadedAsset<'_>>) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            callback,
        }
    }

    /// Current counts
    pub fn state(&self) -> ProgressState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F> LoadObserver for ProgressTracker<F>
where
    F: Fn(ProgressState, Option<LoadedAsset<'_>>) + Send + Sync,
{
    fn dispatched(&self, _descriptor: &AssetDescriptor) {
        // Callback runs under the lock so snapshots arrive in update order
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.total += 1;
        (self.callback)(*state, None);
    }

    fn completed(&self, asset: LoadedAsset<'_>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.complete += 1;
        (self.callback)(*state, Some(asset));
    }
}

/// Human-readable progress line, e.g. `3/7 (+ 12.5 kB png)`
pub fn progress_line(state: ProgressState, loaded: Option<LoadedAsset<'_>>) -> String {
    let mut line = format!("{}/{}", state.complete, state.total);
    if let Some(asset) = loaded {
        let kilobytes = asset.data.len() as f64 / 1000.0;
        line.push_str(&format!(" (+ {} kB {})", kilobytes, asset.descriptor.data_format));
    }
    line
}

//! Time-windowed input buffer matched against stunt sequences.
use log::trace;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::TuningConfig;
use crate::constants::COMBO_CAPACITY;
use crate::input::{Direction, InputEvent};
use crate::stunts::StuntCatalog;

/// Sliding combo buffer.
///
/// A gap longer than the window wipes all progress; overflow evicts the oldest
/// symbol. Matching only happens while the caller reports the character as
/// eligible, but symbols are buffered either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboRecognizer {
    buffer: SmallVec<[InputEvent; COMBO_CAPACITY]>,
    window_ms: u64,
    capacity: usize,
}

/// Combo progress exposed to the HUD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboSnapshot {
    pub symbols: Vec<Direction>,
    pub time_remaining_ms: u64,
}

impl ComboRecognizer {
    #[must_use]
    pub fn new(cfg: &TuningConfig) -> Self {
        Self {
            buffer: SmallVec::new(),
            window_ms: cfg.combo_window_ms,
            capacity: cfg.combo_capacity.clamp(1, COMBO_CAPACITY),
        }
    }

    /// Buffer a symbol and, when eligible, look for a completed stunt.
    ///
    /// Returns the name of the first unlocked stunt (in catalog order) whose
    /// sequence ends the buffer. The buffer is emptied on a match whether or
    /// not the stunt ends up firing.
    pub fn submit(
        &mut self,
        symbol: Direction,
        timestamp_ms: u64,
        eligible: bool,
        catalog: &StuntCatalog,
    ) -> Option<String> {
        if let Some(last) = self.buffer.last()
            && timestamp_ms.saturating_sub(last.timestamp_ms) > self.window_ms
        {
            trace!("combo window lapsed, dropping {} symbols", self.buffer.len());
            self.buffer.clear();
        }

        self.buffer.push(InputEvent::new(symbol, timestamp_ms));
        if self.buffer.len() > self.capacity {
            self.buffer.remove(0);
        }

        if !eligible {
            return None;
        }

        let symbols = self.symbols();
        let name = catalog.match_suffix(&symbols)?.name.clone();
        self.buffer.clear();
        Some(name)
    }

    #[must_use]
    pub fn symbols(&self) -> SmallVec<[Direction; COMBO_CAPACITY]> {
        self.buffer.iter().map(|event| event.symbol).collect()
    }

    #[must_use]
    pub fn events(&self) -> &[InputEvent] {
        &self.buffer
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Milliseconds left before the next symbol would start a fresh combo.
    #[must_use]
    pub fn time_remaining_ms(&self, now_ms: u64) -> u64 {
        self.buffer.last().map_or(0, |last| {
            self.window_ms
                .saturating_sub(now_ms.saturating_sub(last.timestamp_ms))
        })
    }

    #[must_use]
    pub fn snapshot(&self, now_ms: u64) -> ComboSnapshot {
        ComboSnapshot {
            symbols: self.symbols().to_vec(),
            time_remaining_ms: self.time_remaining_ms(now_ms),
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for ComboRecognizer {
    fn default() -> Self {
        Self::new(&TuningConfig::default())
    }
}

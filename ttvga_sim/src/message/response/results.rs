use bitvec::vec::BitVec;

#[derive(Clone, Debug, Default)]
pub struct SimulationResult {
    pub waves: Vec<Wave>,
    pub time_step_ps: u64,
    pub current_time: u64,
}

/// Run-length encoded history of one signal: `(value, start, duration)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wave {
    pub signal_name: String,
    pub width: usize,
    pub values: Vec<(BitVec<u32>, u64, u64)>,
}

impl From<ttvga_rs::Signal> for Wave {
    fn from(signal: ttvga_rs::Signal) -> Self {
        Wave {
            signal_name: signal.name,
            width: signal.width as usize,
            values: vec![],
        }
    }
}

impl SimulationResult {
    pub fn wave(&self, signal_name: &str) -> Option<&Wave> {
        self.waves.iter().find(|w| w.signal_name == signal_name)
    }

    pub fn extend_to(&mut self, time: u64) {
        for wave in self.waves.iter_mut() {
            wave.extend_to(time);
        }
        self.current_time = time;
    }
}

impl Wave {
    /// Records `value` as the signal value from `time` on.
    ///
    /// A second value recorded at the same time replaces the first, so zero
    /// width glitches never reach the history.
    pub fn record(&mut self, value: BitVec<u32>, time: u64) {
        match self.values.last_mut() {
            Some((last_value, _, _)) if *last_value == value => {}
            Some((last_value, start, _)) if *start == time => {
                *last_value = value;
                self.merge_last();
            }
            Some((_, start, duration)) => {
                *duration = time - *start;
                self.values.push((value, time, 0));
            }
            None => self.values.push((value, time, 0)),
        }
    }

    pub fn extend_to(&mut self, time: u64) {
        if let Some((_, start, duration)) = self.values.last_mut() {
            *duration = time.saturating_sub(*start);
        }
    }

    pub fn value_idx_at(&self, time: u64) -> Option<(usize, u64)> {
        match self.values.binary_search_by(|v| (v.1).cmp(&time)) {
            Ok(idx) => Some((idx, 0)),
            Err(0) => None,
            Err(idx) => {
                let offset = time - self.values[idx - 1].1;
                if offset < self.values[idx - 1].2 {
                    Some((idx - 1, offset))
                } else {
                    None
                }
            }
        }
    }

    pub fn value_at(&self, time: u64) -> Option<&BitVec<u32>> {
        self.value_idx_at(time).map(|(idx, _)| &self.values[idx].0)
    }

    /// Times at which the signal went from all zeros to a non-zero value.
    pub fn rising_edges(&self) -> Vec<u64> {
        self.values
            .windows(2)
            .filter(|pair| pair[0].0.not_any() && pair[1].0.any())
            .map(|pair| pair[1].1)
            .collect()
    }

    pub fn falling_edges(&self) -> Vec<u64> {
        self.values
            .windows(2)
            .filter(|pair| pair[0].0.any() && pair[1].0.not_any())
            .map(|pair| pair[1].1)
            .collect()
    }

    fn merge_last(&mut self) {
        let len = self.values.len();
        if len >= 2 && self.values[len - 2].0 == self.values[len - 1].0 {
            self.values.pop();
        }
    }
}

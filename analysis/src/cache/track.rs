use common::Tick;

/// Records `value` at `tick` in a tick ordered list of entries, replacing an entry
/// already recorded at the same tick.
pub fn record<T>(entries: &mut Vec<(Tick, T)>, tick: Tick, value: T) {
    match entries.last_mut() {
        Some((last, slot)) if *last == tick => {
            *slot = value;
        }
        Some((last, _)) if *last > tick => {
            let idx = entries.partition_point(|(t, _)| *t < tick);
            match entries.get_mut(idx) {
                Some((t, slot)) if *t == tick => *slot = value,
                _ => entries.insert(idx, (tick, value)),
            }
        }
        _ => entries.push((tick, value)),
    }
}

/// A step function over ticks: the value at a tick is the last one recorded at or
/// before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<T> {
    ticks: Vec<Tick>,
    values: Vec<T>,
}

impl<T> Track<T> {
    /// Entries may arrive in any order, for duplicate ticks the later entry wins.
    pub fn from_entries(mut entries: Vec<(Tick, T)>) -> Self {
        if !entries.windows(2).all(|w| w[0].0 < w[1].0) {
            entries.reverse();
            entries.sort_by_key(|(tick, _)| *tick);
            entries.dedup_by_key(|(tick, _)| *tick);
        }

        let (ticks, values) = entries.into_iter().unzip();
        Self { ticks, values }
    }

    pub fn at(&self, tick: Tick) -> Option<(Tick, &T)> {
        let idx = self.ticks.partition_point(|t| *t <= tick).checked_sub(1)?;
        Some((self.ticks[idx], &self.values[idx]))
    }

    pub fn first_tick(&self) -> Option<Tick> {
        self.ticks.first().copied()
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.ticks.last().copied()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tick, &T)> + '_ {
        self.ticks.iter().copied().zip(self.values.iter())
    }
}

impl<T: Clone> Track<T> {
    pub fn to_entries(&self) -> Vec<(Tick, T)> {
        self.iter().map(|(tick, value)| (tick, value.clone())).collect()
    }
}

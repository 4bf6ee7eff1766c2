//! Compact foot identifiers and fixed-capacity per-foot storage.
//!
//! Foot names only exist at the edges (robot description, sequence files).
//! The engine resolves them once into [`FootId`]s through a [`FootSet`] and
//! keeps every per-foot quantity in a [`FootMap`], a fixed array indexed by
//! foot id.

use std::fmt;

use clankers_core::error::PreviewError;

/// Maximum number of feet a robot may declare.
pub const MAX_FEET: usize = 8;

/// Index of a foot inside its [`FootSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FootId(u8);

impl FootId {
    /// Callers keep `index < MAX_FEET`.
    #[allow(clippy::cast_possible_truncation)]
    const fn from_index(index: usize) -> Self {
        Self(index as u8)
    }

    /// Position of this foot in the owning set.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "foot#{}", self.0)
    }
}

/// Ordered set of foot names resolved once at engine construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FootSet {
    names: Vec<String>,
}

impl FootSet {
    /// Build a foot set from the robot's foot names.
    ///
    /// # Errors
    ///
    /// Fails when there are more than [`MAX_FEET`] feet or a name repeats.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self, PreviewError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() > MAX_FEET {
            return Err(PreviewError::InvalidFeet(format!(
                "{} feet declared, at most {MAX_FEET} supported",
                names.len()
            )));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(PreviewError::InvalidFeet(format!("duplicate foot {name}")));
            }
        }
        Ok(Self { names })
    }

    /// Number of feet.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a foot name.
    pub fn id(&self, name: &str) -> Option<FootId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| FootId::from_index(i))
    }

    /// Resolve a foot name, failing loudly on unknown names.
    pub fn require(&self, name: &str) -> Result<FootId, PreviewError> {
        self.id(name).ok_or_else(|| PreviewError::UnknownFoot {
            foot: name.to_owned(),
        })
    }

    /// Name of a foot. Ids from another set yield `"?"`.
    pub fn name(&self, foot: FootId) -> &str {
        self.names.get(foot.index()).map_or("?", String::as_str)
    }

    /// Whether `foot` belongs to this set.
    pub fn contains(&self, foot: FootId) -> bool {
        foot.index() < self.names.len()
    }

    /// All foot ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = FootId> + '_ {
        (0..self.names.len()).map(|i| FootId::from_index(i))
    }

    /// All foot names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Per-foot storage with one optional slot per [`FootId`].
#[derive(Clone, PartialEq)]
pub struct FootMap<T> {
    slots: [Option<T>; MAX_FEET],
}

impl<T> FootMap<T> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    pub fn get(&self, foot: FootId) -> Option<&T> {
        self.slots.get(foot.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, foot: FootId) -> Option<&mut T> {
        self.slots.get_mut(foot.index()).and_then(Option::as_mut)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, foot: FootId, value: T) -> Option<T> {
        self.slots[foot.index()].replace(value)
    }

    pub fn remove(&mut self, foot: FootId) -> Option<T> {
        self.slots.get_mut(foot.index()).and_then(Option::take)
    }

    pub fn contains(&self, foot: FootId) -> bool {
        self.get(foot).is_some()
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Occupied slots in foot-id order.
    pub fn iter(&self) -> impl Iterator<Item = (FootId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (FootId::from_index(i), v)))
    }

    /// Occupied foot ids in order.
    pub fn keys(&self) -> impl Iterator<Item = FootId> + '_ {
        self.iter().map(|(foot, _)| foot)
    }
}

impl<T> Default for FootMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for FootMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<(FootId, T)> for FootMap<T> {
    fn from_iter<I: IntoIterator<Item = (FootId, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (foot, value) in iter {
            map.insert(foot, value);
        }
        map
    }
}

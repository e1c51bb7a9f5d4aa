//! Axis and parameter words
//!
//! The parameter alphabet of the dialect is small and closed, so every lookup
//! is an array index rather than a hash.

use serde::{Deserialize, Serialize};

/// Machine axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal
    X,
    /// Vertical (in the XY plane)
    Y,
    /// Depth
    Z,
    /// Rotary about X
    A,
    /// Rotary about Y
    B,
    /// Rotary about Z
    C,
}

impl Axis {
    /// Number of axes
    pub const COUNT: usize = 6;

    /// All axes in canonical output order
    pub const ALL: [Axis; Axis::COUNT] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B, Axis::C];

    /// Dense index of this axis
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Word letter for this axis
    pub const fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::B => 'B',
            Axis::C => 'C',
        }
    }

    /// Whether this is the depth axis
    pub const fn is_depth(self) -> bool {
        matches!(self, Axis::Z)
    }

    /// Whether this is a rotary axis
    pub const fn is_rotary(self) -> bool {
        matches!(self, Axis::A | Axis::B | Axis::C)
    }

    /// The parameter word carrying this axis
    pub const fn param(self) -> Param {
        match self {
            Axis::X => Param::X,
            Axis::Y => Param::Y,
            Axis::Z => Param::Z,
            Axis::A => Param::A,
            Axis::B => Param::B,
            Axis::C => Param::C,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Parameter word of an instruction
///
/// Declaration order is the canonical serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    X,
    Y,
    Z,
    A,
    B,
    C,
    /// Feed rate
    F,
    /// Spindle speed
    S,
    I,
    J,
    K,
    P,
    Q,
    R,
    E,
    H,
    D,
    L,
    /// Line number
    N,
}

impl Param {
    /// Number of parameter words
    pub const COUNT: usize = 19;

    /// All parameter words in canonical order
    pub const ALL: [Param; Param::COUNT] = [
        Param::X,
        Param::Y,
        Param::Z,
        Param::A,
        Param::B,
        Param::C,
        Param::F,
        Param::S,
        Param::I,
        Param::J,
        Param::K,
        Param::P,
        Param::Q,
        Param::R,
        Param::E,
        Param::H,
        Param::D,
        Param::L,
        Param::N,
    ];

    /// Dense index of this parameter
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a parameter by its (case-insensitive) word letter
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        Self::ALL.iter().copied().find(|p| p.letter() == upper)
    }

    /// Word letter
    pub const fn letter(self) -> char {
        match self {
            Param::X => 'X',
            Param::Y => 'Y',
            Param::Z => 'Z',
            Param::A => 'A',
            Param::B => 'B',
            Param::C => 'C',
            Param::F => 'F',
            Param::S => 'S',
            Param::I => 'I',
            Param::J => 'J',
            Param::K => 'K',
            Param::P => 'P',
            Param::Q => 'Q',
            Param::R => 'R',
            Param::E => 'E',
            Param::H => 'H',
            Param::D => 'D',
            Param::L => 'L',
            Param::N => 'N',
        }
    }

    /// The axis this parameter positions, if any
    pub const fn axis(self) -> Option<Axis> {
        match self {
            Param::X => Some(Axis::X),
            Param::Y => Some(Axis::Y),
            Param::Z => Some(Axis::Z),
            Param::A => Some(Axis::A),
            Param::B => Some(Axis::B),
            Param::C => Some(Axis::C),
            _ => None,
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Set of axes, stored as a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisSet(u8);

impl AxisSet {
    /// Empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Add an axis
    pub fn insert(&mut self, axis: Axis) {
        self.0 |= 1 << axis.index();
    }

    /// Builder form of [`AxisSet::insert`]
    pub fn with(mut self, axis: Axis) -> Self {
        self.insert(axis);
        self
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.0 & (1 << axis.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// True when any axis other than depth is present
    pub fn has_non_depth_axis(&self) -> bool {
        Axis::ALL
            .iter()
            .any(|axis| !axis.is_depth() && self.contains(*axis))
    }

    /// Iterate members in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL.into_iter().filter(move |axis| self.contains(*axis))
    }
}

impl FromIterator<Axis> for AxisSet {
    fn from_iter<T: IntoIterator<Item = Axis>>(iter: T) -> Self {
        let mut set = AxisSet::empty();
        for axis in iter {
            set.insert(axis);
        }
        set
    }
}

/// Fixed-size parameter storage keyed by [`Param`]
///
/// Presence is explicit: a word that was not written on the line is `None`,
/// never a default value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    values: [Option<f64>; Param::COUNT],
}

impl ParamSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: Param) -> Option<f64> {
        self.values[param.index()]
    }

    pub fn set(&mut self, param: Param, value: f64) {
        self.values[param.index()] = Some(value);
    }

    /// Builder form of [`ParamSet::set`]
    pub fn with(mut self, param: Param, value: f64) -> Self {
        self.set(param, value);
        self
    }

    pub fn remove(&mut self, param: Param) -> Option<f64> {
        self.values[param.index()].take()
    }

    pub fn contains(&self, param: Param) -> bool {
        self.values[param.index()].is_some()
    }

    /// Value of an axis word
    pub fn axis(&self, axis: Axis) -> Option<f64> {
        self.get(axis.param())
    }

    /// Axes explicitly written on the line
    pub fn axes(&self) -> AxisSet {
        Axis::ALL
            .into_iter()
            .filter(|axis| self.axis(*axis).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Iterate present words in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Param, f64)> + '_ {
        Param::ALL
            .into_iter()
            .filter_map(move |param| self.get(param).map(|value| (param, value)))
    }
}

//! Mapper configuration.
//!
//! [`MapperOptions`] is one immutable value threaded by reference through
//! the search. It can be deserialized, or built from the classic string
//! options with [`MapperOptions::set`]:
//!
//! ```
//! use qmap_mapper::{Lookahead, MapperOptions};
//!
//! let mut options = MapperOptions::default();
//! options.set("maplookahead", "all").unwrap();
//! options.set("mapselectmaxlevel", "inf").unwrap();
//!
//! assert_eq!(options.lookahead, Lookahead::All);
//! assert!(options.set("maplookahead", "sideways").is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, MapResult};

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $key:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Option key this value is set with.
            pub const KEY: &'static str = $key;

            /// The option value as text.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = MapError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(invalid($key, s)),
                }
            }
        }
    };
}

fn invalid(option: &str, value: &str) -> MapError {
    MapError::InvalidOptionValue {
        option: option.to_string(),
        value: value.to_string(),
    }
}

option_enum! {
    /// Routing heuristic.
    Heuristic, "mapper" {
        /// Take the first alternative without scoring.
        Base => "base",
        /// As `base`, with resource-constrained scheduling.
        BaseRc => "baserc",
        /// Minimise the extension of the schedule.
        MinExtend => "minextend",
        /// As `minextend`, with resource-constrained scheduling.
        MinExtendRc => "minextendrc",
    }
}

impl Heuristic {
    /// Whether scheduling consults the resource manager.
    pub fn is_resource_constrained(self) -> bool {
        matches!(self, Heuristic::BaseRc | Heuristic::MinExtendRc)
    }

    /// Whether alternatives are chosen without scoring.
    pub fn is_base(self) -> bool {
        matches!(self, Heuristic::Base | Heuristic::BaseRc)
    }
}

option_enum! {
    /// Which gates are considered before routing.
    Lookahead, "maplookahead" {
        /// Strict program order.
        No => "no",
        /// Map every available single-qubit gate first.
        OneQFirst => "1qfirst",
        /// Also map available nearest-neighbour two-qubit gates first.
        NoRoutingFirst => "noroutingfirst",
        /// As `noroutingfirst`, and route for every available two-qubit gate.
        All => "all",
    }
}

impl Lookahead {
    /// Whether a dependency graph drives the input.
    pub fn uses_dependency_graph(self) -> bool {
        self != Lookahead::No
    }

    /// Whether nearest-neighbour two-qubit gates are mapped before routing.
    pub fn maps_adjacent_first(self) -> bool {
        matches!(self, Lookahead::NoRoutingFirst | Lookahead::All)
    }
}

option_enum! {
    /// Which shortest paths are enumerated.
    PathSelect, "mappathselect" {
        /// Every shortest path.
        All => "all",
        /// Only paths hugging the outer borders.
        Borders => "borders",
    }
}

option_enum! {
    /// How many alternatives beyond the best ones enter the recursion.
    MaxWidth, "mapselectmaxwidth" {
        /// Only the minimum.
        Min => "min",
        /// Minimum plus one cycle.
        MinPlusOne => "minplusone",
        /// Minimum plus half of it.
        MinPlusHalfMin => "minplushalfmin",
        /// Twice the minimum.
        MinPlusMin => "minplusmin",
        /// Every alternative.
        All => "all",
    }
}

impl MaxWidth {
    /// Number of score-sorted alternatives kept for recursion, given that
    /// `tied` of `total` share the minimum score.
    pub fn keep(self, tied: usize, total: usize) -> usize {
        let keep = match self {
            MaxWidth::Min => tied,
            MaxWidth::MinPlusOne => tied + 1,
            MaxWidth::MinPlusHalfMin => tied + tied / 2,
            MaxWidth::MinPlusMin => 2 * tied,
            MaxWidth::All => total,
        };
        keep.min(total)
    }
}

option_enum! {
    /// Choice among equally good alternatives.
    TieBreak, "maptiebreak" {
        /// The first one.
        First => "first",
        /// The last one.
        Last => "last",
        /// A random one.
        Random => "random",
        /// The one whose target gate is most critical.
        Critical => "critical",
    }
}

option_enum! {
    /// How many swaps of an alternative are committed per step.
    SelectSwaps, "mapselectswaps" {
        /// One swap, from the source side if any.
        One => "one",
        /// The full chains from both sides.
        All => "all",
        /// One swap, from whichever side starts earliest.
        Earliest => "earliest",
    }
}

option_enum! {
    /// Operand order of generated swaps.
    SwapOrder, "mapreverseswap" {
        /// Keep the order of the path.
        AsGiven => "no",
        /// Put the qubit that is free first in the second operand.
        EarlierFirst => "yes",
    }
}

/// Whether moves replace swaps when one side carries no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MoveMode {
    /// Always swap.
    Disabled,
    /// Move when initialising the stateless side costs at most `threshold` cycles.
    Enabled {
        /// Extra cycles allowed for the initialisation.
        threshold: u64,
    },
}

impl FromStr for MoveMode {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => Ok(MoveMode::Disabled),
            "yes" => Ok(MoveMode::Enabled { threshold: 0 }),
            n => n
                .parse()
                .map(|threshold| MoveMode::Enabled { threshold })
                .map_err(|_| invalid("mapusemoves", s)),
        }
    }
}

impl fmt::Display for MoveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveMode::Disabled => f.write_str("no"),
            MoveMode::Enabled { threshold: 0 } => f.write_str("yes"),
            MoveMode::Enabled { threshold } => write!(f, "{threshold}"),
        }
    }
}

/// Recursion depth of the alternative selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaxLevel {
    /// Recurse at most this many levels.
    Bounded(usize),
    /// Recurse until the kernel is exhausted.
    Unbounded,
}

impl MaxLevel {
    /// Whether `level` is at or beyond the ceiling.
    pub fn reached(self, level: usize) -> bool {
        match self {
            MaxLevel::Bounded(max) => level >= max,
            MaxLevel::Unbounded => false,
        }
    }
}

impl FromStr for MaxLevel {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inf" => Ok(MaxLevel::Unbounded),
            n => n
                .parse()
                .map(MaxLevel::Bounded)
                .map_err(|_| invalid("mapselectmaxlevel", s)),
        }
    }
}

impl fmt::Display for MaxLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxLevel::Bounded(n) => write!(f, "{n}"),
            MaxLevel::Unbounded => f.write_str("inf"),
        }
    }
}

/// Whether and how the initial placement solver runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InitialPlace {
    /// Do not run it.
    No,
    /// Run it without time limit.
    Unlimited,
    /// Run it for at most `limit`.
    Limited {
        /// Wall-clock limit.
        limit: Duration,
        /// Abort the compilation when the limit expires.
        abort_on_timeout: bool,
    },
}

impl FromStr for InitialPlace {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no" => return Ok(InitialPlace::No),
            "yes" => return Ok(InitialPlace::Unlimited),
            _ => {}
        }
        let (body, abort_on_timeout) = match s.strip_suffix('x') {
            Some(body) => (body, true),
            None => (s, false),
        };
        let unit = body.chars().last().ok_or_else(|| invalid("initialplace", s))?;
        let scale = match unit {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            _ => return Err(invalid("initialplace", s)),
        };
        let count: u64 = body[..body.len() - 1]
            .parse()
            .map_err(|_| invalid("initialplace", s))?;
        Ok(InitialPlace::Limited {
            limit: Duration::from_secs(count * scale),
            abort_on_timeout,
        })
    }
}

impl fmt::Display for InitialPlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitialPlace::No => f.write_str("no"),
            InitialPlace::Unlimited => f.write_str("yes"),
            InitialPlace::Limited {
                limit,
                abort_on_timeout,
            } => {
                let secs = limit.as_secs();
                let text = if secs % 3600 == 0 && secs > 0 {
                    format!("{}h", secs / 3600)
                } else if secs % 60 == 0 && secs > 0 {
                    format!("{}m", secs / 60)
                } else {
                    format!("{secs}s")
                };
                write!(f, "{text}{}", if *abort_on_timeout { "x" } else { "" })
            }
        }
    }
}

macro_rules! string_serde {
    ($($name:ident),+) => {
        $(
            impl TryFrom<String> for $name {
                type Error = MapError;

                fn try_from(s: String) -> Result<Self, Self::Error> {
                    s.parse()
                }
            }

            impl From<$name> for String {
                fn from(v: $name) -> String {
                    v.to_string()
                }
            }
        )+
    };
}

string_serde!(MoveMode, MaxLevel, InitialPlace);

fn parse_flag(option: &str, value: &str) -> MapResult<bool> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(invalid(option, value)),
    }
}

/// All mapper options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MapperOptions {
    /// Routing heuristic (`mapper`).
    pub heuristic: Heuristic,
    /// Start from the identity mapping instead of an undefined one (`mapinitone2one`).
    pub init_one_to_one: bool,
    /// Physical qubits start in |0> rather than garbage (`mapassumezeroinitstate`).
    pub assume_zero_init_state: bool,
    /// A mapped `prepz` leaves its qubit initialised rather than live (`mapprepinitsstate`).
    pub prep_inits_state: bool,
    /// Lookahead breadth (`maplookahead`).
    pub lookahead: Lookahead,
    /// Path enumeration (`mappathselect`).
    pub path_select: PathSelect,
    /// Widening of the kept set (`mapselectmaxwidth`).
    pub max_width: MaxWidth,
    /// Recursion ceiling (`mapselectmaxlevel`).
    pub max_level: MaxLevel,
    /// Map nearest-neighbour two-qubit gates inside the recursion too (`maprecNN2q`).
    pub rec_nn2q: bool,
    /// Tie-break (`maptiebreak`).
    pub tie_break: TieBreak,
    /// Swaps committed per step (`mapselectswaps`).
    pub select_swaps: SelectSwaps,
    /// Move usage (`mapusemoves`).
    pub use_moves: MoveMode,
    /// Swap operand order (`mapreverseswap`).
    pub swap_order: SwapOrder,
    /// Cycles by which a swap's first operand is busy before its second (`mapswaplead`).
    pub swap_lead: u64,
    /// Initial placement (`initialplace`).
    pub initial_place: InitialPlace,
    /// Two-qubit gates considered by initial placement, 0 for all (`initialplace2qhorizon`).
    pub placement_horizon: usize,
    /// Seed for random tie-breaks (`mapseed`).
    pub seed: Option<u64>,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::MinExtend,
            init_one_to_one: true,
            assume_zero_init_state: false,
            prep_inits_state: false,
            lookahead: Lookahead::NoRoutingFirst,
            path_select: PathSelect::All,
            max_width: MaxWidth::Min,
            max_level: MaxLevel::Bounded(0),
            rec_nn2q: false,
            tie_break: TieBreak::Random,
            select_swaps: SelectSwaps::All,
            use_moves: MoveMode::Enabled { threshold: 0 },
            swap_order: SwapOrder::EarlierFirst,
            swap_lead: 1,
            initial_place: InitialPlace::No,
            placement_horizon: 0,
            seed: None,
        }
    }
}

impl MapperOptions {
    /// Set one option from its classic key and textual value.
    pub fn set(&mut self, key: &str, value: &str) -> MapResult<()> {
        let value = value.trim();
        match key {
            Heuristic::KEY => self.heuristic = value.parse()?,
            "mapinitone2one" => self.init_one_to_one = parse_flag(key, value)?,
            "mapassumezeroinitstate" => self.assume_zero_init_state = parse_flag(key, value)?,
            "mapprepinitsstate" => self.prep_inits_state = parse_flag(key, value)?,
            Lookahead::KEY => self.lookahead = value.parse()?,
            PathSelect::KEY => self.path_select = value.parse()?,
            MaxWidth::KEY => self.max_width = value.parse()?,
            "mapselectmaxlevel" => self.max_level = value.parse()?,
            "maprecNN2q" => self.rec_nn2q = parse_flag(key, value)?,
            TieBreak::KEY => self.tie_break = value.parse()?,
            SelectSwaps::KEY => self.select_swaps = value.parse()?,
            "mapusemoves" => self.use_moves = value.parse()?,
            SwapOrder::KEY => self.swap_order = value.parse()?,
            "mapswaplead" => {
                self.swap_lead = value.parse().map_err(|_| invalid(key, value))?;
            }
            "initialplace" => self.initial_place = value.parse()?,
            "initialplace2qhorizon" => {
                self.placement_horizon = value.parse().map_err(|_| invalid(key, value))?;
            }
            "mapseed" => self.seed = Some(value.parse().map_err(|_| invalid(key, value))?),
            _ => return Err(MapError::UnknownOption(key.to_string())),
        }
        Ok(())
    }

    /// Apply `key=value` assignments in order.
    pub fn apply<'a>(&mut self, assignments: impl IntoIterator<Item = &'a str>) -> MapResult<()> {
        for assignment in assignments {
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| MapError::UnknownOption(assignment.to_string()))?;
            self.set(key.trim(), value)?;
        }
        Ok(())
    }

    /// Set an option, builder style.
    pub fn with(mut self, key: &str, value: &str) -> MapResult<Self> {
        self.set(key, value)?;
        Ok(self)
    }
}

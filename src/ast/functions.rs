use crate::parser::ParseError;

/// The fixed set of built-in functions.
///
/// Formulas cannot define functions of their own; a call to any other name
/// is rejected when the formula is compiled, as is a call with the wrong
/// number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `if(cond, then, else)`, only the selected branch is evaluated
    If,
    /// `abs(n)`
    Abs,
    /// `min(a, ...)`, list arguments are flattened
    Min,
    /// `max(a, ...)`, list arguments are flattened
    Max,
    /// `choose(list, score)`, element with the greatest score
    Choose,
    /// `sort(list)` or `sort(list, a < b)`
    Sort,
    /// `filter(list, predicate)`
    Filter,
    /// `find(list, predicate)`, first match or 0
    Find,
    /// `map(list, expression)`
    Map,
    /// `sum(list)`
    Sum,
    /// `head(list)`
    Head,
    /// `size(list)`
    Size,
    /// `rgb(r, g, b)`, packs clamped channels as `r*10000 + g*100 + b`
    Rgb,
    /// `transition(value, begin, val1, end, val2)`
    Transition,
    /// `color_transition(value, b0, c0, b1, c1, ...)`
    ColorTransition,
    /// `loc(x, y)`, a hex-grid location
    Loc,
    /// `distance(loc1, loc2)`, hex-grid distance
    Distance,
}

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Between(usize, usize),
    AtLeast(usize),
    /// An odd count of at least the given minimum
    OddAtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => n == k,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(k) => n >= k,
            Arity::OddAtLeast(k) => n >= k && n % 2 == 1,
        }
    }

    pub fn describe(self) -> String {
        match self {
            Arity::Exactly(k) => k.to_string(),
            Arity::Between(lo, hi) => format!("{lo} to {hi}"),
            Arity::AtLeast(k) => format!("at least {k}"),
            Arity::OddAtLeast(k) => format!("an odd number, at least {k},"),
        }
    }
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "if" => Builtin::If,
            "abs" => Builtin::Abs,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "choose" => Builtin::Choose,
            "sort" => Builtin::Sort,
            "filter" => Builtin::Filter,
            "find" => Builtin::Find,
            "map" => Builtin::Map,
            "sum" => Builtin::Sum,
            "head" => Builtin::Head,
            "size" => Builtin::Size,
            "rgb" => Builtin::Rgb,
            "transition" => Builtin::Transition,
            "color_transition" => Builtin::ColorTransition,
            "loc" => Builtin::Loc,
            "distance" => Builtin::Distance,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::If => "if",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Choose => "choose",
            Builtin::Sort => "sort",
            Builtin::Filter => "filter",
            Builtin::Find => "find",
            Builtin::Map => "map",
            Builtin::Sum => "sum",
            Builtin::Head => "head",
            Builtin::Size => "size",
            Builtin::Rgb => "rgb",
            Builtin::Transition => "transition",
            Builtin::ColorTransition => "color_transition",
            Builtin::Loc => "loc",
            Builtin::Distance => "distance",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Builtin::If | Builtin::Rgb => Arity::Exactly(3),
            Builtin::Abs | Builtin::Sum | Builtin::Head | Builtin::Size => Arity::Exactly(1),
            Builtin::Min | Builtin::Max => Arity::AtLeast(1),
            Builtin::Sort => Arity::Between(1, 2),
            Builtin::Choose
            | Builtin::Filter
            | Builtin::Find
            | Builtin::Map
            | Builtin::Loc
            | Builtin::Distance => Arity::Exactly(2),
            Builtin::Transition => Arity::Exactly(5),
            Builtin::ColorTransition => Arity::OddAtLeast(5),
        }
    }

    /// Resolve a call site: the name must be known and the argument count
    /// must fit.
    pub fn resolve(name: &str, args: usize) -> Result<Builtin, ParseError> {
        let builtin =
            Builtin::from_name(name).ok_or_else(|| ParseError::UnknownFunction(name.to_string()))?;
        let arity = builtin.arity();
        if !arity.accepts(args) {
            return Err(ParseError::Arity {
                function: builtin.name(),
                expected: arity.describe(),
                got: args,
            });
        }
        Ok(builtin)
    }
}

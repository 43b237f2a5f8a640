//! Parameter Sets

use crate::base::*;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

/// A named parameter value and whether it was looked up.
#[derive(Clone, Debug)]
pub struct ParamSetItem<T> {
    /// The values.
    pub values: Vec<T>,

    /// Set once a lookup found the item.
    looked_up: Cell<bool>,
}

impl<T> ParamSetItem<T> {
    /// Create a new `ParamSetItem<T>`.
    ///
    /// * `values` - The values.
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values,
            looked_up: Cell::new(false),
        }
    }
}

/// Parameter items stored by name.
pub type ParamSetMap<T> = BTreeMap<String, ParamSetItem<T>>;

/// Stores typed configuration parameters by name.
#[derive(Clone, Debug, Default)]
pub struct ParamSet {
    pub bools: ParamSetMap<bool>,
    pub ints: ParamSetMap<Int>,
    pub floats: ParamSetMap<Float>,
    pub strings: ParamSetMap<String>,
}

/// Define a macro that can be used to generate a function for adding/replacing
/// parameter set item.
macro_rules! paramset_add {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&mut self, name: &str, values: &[$t]) {
            self.$paramset.insert(name.to_string(), ParamSetItem::new(values.to_vec()));
        }
    };
}

/// Define a macro that can be used to generate a function for finding
/// parameter set item that is stored as a single item.
macro_rules! paramset_find_one {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&self, name: &str, default: $t) -> $t {
            match self.$paramset.get(name) {
                Some(param) if param.values.len() == 1 => {
                    param.looked_up.set(true);
                    param.values[0].clone()
                }
                _ => default,
            }
        }
    };
}

impl ParamSet {
    /// Returns a new `ParamSet`.
    pub fn new() -> Self {
        Self::default()
    }

    paramset_add!(add_bool, bool, bools);
    paramset_add!(add_int, Int, ints);
    paramset_add!(add_float, Float, floats);
    paramset_add!(add_string, String, strings);

    paramset_find_one!(find_one_bool, bool, bools);
    paramset_find_one!(find_one_int, Int, ints);
    paramset_find_one!(find_one_string, String, strings);

    /// Returns a single float parameter. Integer parameters of the same name are accepted too, so `minBound=2` and
    /// `minBound=2.0` mean the same thing.
    ///
    /// * `name`    - Parameter name.
    /// * `default` - Value returned when the parameter is missing.
    pub fn find_one_float(&self, name: &str, default: Float) -> Float {
        match self.floats.get(name) {
            Some(param) if param.values.len() == 1 => {
                param.looked_up.set(true);
                param.values[0]
            }
            _ => match self.ints.get(name) {
                Some(param) if param.values.len() == 1 => {
                    param.looked_up.set(true);
                    param.values[0] as Float
                }
                _ => default,
            },
        }
    }

    /// Adds a parameter from a `name=value` string. The type is inferred from the value: `true`/`false` become a
    /// bool, whole numbers an int, other numbers a float and everything else a string.
    ///
    /// * `assignment` - The `name=value` string.
    pub fn add_assignment(&mut self, assignment: &str) -> Result<(), String> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Parameter '{assignment}' is not of the form name=value"))?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return Err(format!("Parameter '{assignment}' has no name"));
        }

        if let Ok(b) = value.parse::<bool>() {
            self.add_bool(name, &[b]);
        } else if let Ok(i) = value.parse::<Int>() {
            self.add_int(name, &[i]);
        } else if let Ok(f) = value.parse::<Float>() {
            self.add_float(name, &[f]);
        } else {
            self.add_string(name, &[value.to_string()]);
        }
        Ok(())
    }

    /// Returns the names of parameters that were never looked up.
    pub fn unused(&self) -> Vec<String> {
        fn collect<T>(map: &ParamSetMap<T>, out: &mut Vec<String>) {
            out.extend(
                map.iter()
                    .filter(|(_, item)| !item.looked_up.get())
                    .map(|(name, _)| name.clone()),
            );
        }

        let mut names = vec![];
        collect(&self.bools, &mut names);
        collect(&self.ints, &mut names);
        collect(&self.floats, &mut names);
        collect(&self.strings, &mut names);
        names.sort();
        names
    }

    /// Logs a warning for every parameter that was never looked up.
    pub fn report_unused(&self) {
        for name in self.unused() {
            warn!("Parameter '{name}' not used");
        }
    }
}

/// Define a macro that can be used to print parameter set items.
macro_rules! display_param {
    ($params: expr, $param_type: literal, $formatter: expr) => {
        for (name, param) in $params.iter() {
            write!($formatter, "\"{} {}\" [", $param_type, name)?;
            for (i, v) in param.values.iter().enumerate() {
                if i > 0 {
                    write!($formatter, " ")?;
                }
                write!($formatter, "{:?}", v)?;
            }
            writeln!($formatter, "]")?;
        }
    };
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_param!(self.bools, "bool", f);
        display_param!(self.ints, "integer", f);
        display_param!(self.floats, "float", f);
        display_param!(self.strings, "string", f);
        Ok(())
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_infers_types() {
        let mut ps = ParamSet::new();
        ps.add_assignment("lightImage=false").unwrap();
        ps.add_assignment("maxDepth=4").unwrap();
        ps.add_assignment("binWidth=0.5").unwrap();
        ps.add_assignment("decomposition = transient").unwrap();

        assert!(!ps.find_one_bool("lightImage", true));
        assert_eq!(ps.find_one_int("maxDepth", -1), 4);
        assert_eq!(ps.find_one_float("binWidth", 1.0), 0.5);
        assert_eq!(ps.find_one_string("decomposition", String::from("none")), "transient");

        // Integers are accepted where a float is expected.
        assert_eq!(ps.find_one_float("maxDepth", 0.0), 4.0);

        assert!(ps.add_assignment("oops").is_err());
        assert!(ps.add_assignment("=1").is_err());
    }

    #[test]
    fn defaults_and_unused() {
        let mut ps = ParamSet::new();
        ps.add_int("sampleCount", &[64]);
        ps.add_float("minBound", &[1.0]);
        ps.add_float("pair", &[1.0, 2.0]);

        assert_eq!(ps.find_one_int("rrDepth", 5), 5);
        assert_eq!(ps.find_one_int("sampleCount", 16), 64);

        // Multi-valued items fall back to the default.
        assert_eq!(ps.find_one_float("pair", 7.0), 7.0);

        assert_eq!(ps.unused(), vec![String::from("minBound"), String::from("pair")]);
        assert!(format!("{ps}").contains("\"integer sampleCount\" [64]"));
    }
}

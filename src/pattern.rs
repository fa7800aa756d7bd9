//! Named-axis patterns.
//!
//! Einsum, reduction and rearrangement operations describe their axes with
//! the einops notation: operands are separated by commas, axis names by
//! whitespace, and `->` separates the inputs from the output. Output axes
//! wrapped in parentheses are merged into one axis.
//!
//! ```
//! use tensorref::pattern::AxisPattern;
//!
//! let pattern: AxisPattern =
//!     "batch fields memories dim, batch fields dim -> batch fields memories"
//!         .parse()
//!         .unwrap();
//!
//! assert_eq!(pattern.operand_count(), 2);
//! ```

use core::str::FromStr;

use crate::error::PatternError;

/// A parsed pattern, not yet bound to concrete tensor shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPattern {
    source: String,
    operands: Vec<Vec<String>>,
    output: Vec<Vec<String>>,
}

/// A pattern bound to concrete shapes.
///
/// Axis names are replaced by dense label ids; `sizes[id]` is the length
/// every occurrence of that label must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contraction {
    /// Label id of every axis of every operand.
    pub operands: Vec<Vec<usize>>,
    /// Label ids of the output axes, flattened across groups.
    pub output: Vec<usize>,
    /// Number of labels in each output group.
    pub groups: Vec<usize>,
    /// Length bound to each label id.
    pub sizes: Vec<usize>,
}

impl AxisPattern {
    /// Number of input operands the pattern describes.
    #[inline]
    #[must_use]
    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// The text the pattern was parsed from.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether any output group merges more than one axis.
    #[inline]
    #[must_use]
    pub fn has_groups(&self) -> bool {
        self.output.iter().any(|group| group.len() != 1)
    }

    /// Input axes that do not appear in the output, in order of first
    /// appearance.
    #[must_use]
    pub fn summed_axes(&self) -> Vec<&str> {
        let mut summed: Vec<&str> = Vec::new();
        for axis in self.operands.iter().flatten() {
            let kept = self.output.iter().flatten().any(|out| out == axis);
            if !kept && !summed.contains(&axis.as_str()) {
                summed.push(axis);
            }
        }
        summed
    }

    /// Binds the axis names to the shapes of the given operands.
    ///
    /// # Errors
    ///
    /// Fails when the number of shapes or any operand rank disagrees with
    /// the pattern, or when one name is bound to two different lengths.
    pub fn bind(
        &self,
        shapes: &[&[usize]],
    ) -> Result<Contraction, PatternError> {
        if shapes.len() != self.operands.len() {
            return Err(PatternError::OperandCount {
                expected: self.operands.len(),
                actual: shapes.len(),
            });
        }

        let mut names: Vec<&str> = Vec::new();
        let mut sizes: Vec<usize> = Vec::new();
        let mut operands = Vec::with_capacity(shapes.len());

        for (operand, (axes, shape)) in
            self.operands.iter().zip(shapes.iter()).enumerate()
        {
            if axes.len() != shape.len() {
                return Err(PatternError::RankMismatch {
                    operand,
                    ndim: shape.len(),
                    named: axes.len(),
                });
            }

            let mut labels = Vec::with_capacity(axes.len());
            for (name, &len) in axes.iter().zip(shape.iter()) {
                let known =
                    names.iter().position(|known| *known == name.as_str());
                let label = match known {
                    Some(label) => {
                        if sizes[label] != len {
                            return Err(PatternError::ConflictingLength {
                                axis: name.clone(),
                                first: sizes[label],
                                second: len,
                            });
                        }
                        label
                    }
                    None => {
                        names.push(name.as_str());
                        sizes.push(len);
                        names.len() - 1
                    }
                };
                labels.push(label);
            }
            operands.push(labels);
        }

        let mut output = Vec::new();
        let mut groups = Vec::with_capacity(self.output.len());
        for group in &self.output {
            for name in group {
                let label = names
                    .iter()
                    .position(|known| *known == name.as_str())
                    .ok_or_else(|| {
                        PatternError::UnknownOutputAxis(name.clone())
                    })?;
                output.push(label);
            }
            groups.push(group.len());
        }

        Ok(Contraction {
            operands,
            output,
            groups,
            sizes,
        })
    }
}

impl FromStr for AxisPattern {
    type Err = PatternError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let (inputs, output) = source
            .split_once("->")
            .ok_or_else(|| PatternError::MissingArrow(source.to_owned()))?;

        let operands = inputs
            .split(',')
            .map(|operand| {
                let groups = parse_axes(operand)?;
                if groups.iter().any(|group| group.len() != 1) {
                    return Err(PatternError::UnsupportedGroup(
                        source.to_owned(),
                    ));
                }
                let axes: Vec<String> = groups.into_iter().flatten().collect();
                ensure_unique(&axes)?;
                Ok(axes)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = parse_axes(output)?;
        let flat: Vec<String> = output.iter().flatten().cloned().collect();
        ensure_unique(&flat)?;
        if let Some(unknown) = flat
            .iter()
            .find(|name| !operands.iter().flatten().any(|axis| axis == *name))
        {
            return Err(PatternError::UnknownOutputAxis(unknown.clone()));
        }

        Ok(Self {
            source: source.to_owned(),
            operands,
            output,
        })
    }
}

impl Contraction {
    /// Shape of the output before groups are merged.
    #[must_use]
    pub fn output_shape(&self) -> Vec<usize> {
        self.output.iter().map(|&label| self.sizes[label]).collect()
    }

    /// Shape of the output after every group is merged into one axis.
    #[must_use]
    pub fn grouped_shape(&self) -> Vec<usize> {
        let shape = self.output_shape();
        let mut start = 0;
        self.groups
            .iter()
            .map(|&len| {
                let merged: usize = shape[start..start + len].iter().product();
                start += len;
                merged
            })
            .collect()
    }

    /// Labels that appear in some input but not in the output.
    #[must_use]
    pub fn summed_labels(&self) -> Vec<usize> {
        (0..self.sizes.len())
            .filter(|label| !self.output.contains(label))
            .collect()
    }
}

/// Splits one side of a pattern into axis groups. Ungrouped axes become
/// groups of one.
fn parse_axes(side: &str) -> Result<Vec<Vec<String>>, PatternError> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut open: Option<Vec<String>> = None;
    let mut name = String::new();

    let flush = |name: &mut String,
                 open: &mut Option<Vec<String>>,
                 groups: &mut Vec<Vec<String>>|
     -> Result<(), PatternError> {
        if name.is_empty() {
            return Ok(());
        }
        let axis = core::mem::take(name);
        validate_name(&axis)?;
        match open {
            Some(group) => group.push(axis),
            None => groups.push(vec![axis]),
        }
        Ok(())
    };

    for ch in side.chars() {
        match ch {
            '(' => {
                flush(&mut name, &mut open, &mut groups)?;
                if open.is_some() {
                    return Err(PatternError::UnbalancedGroup(side.to_owned()));
                }
                open = Some(Vec::new());
            }
            ')' => {
                flush(&mut name, &mut open, &mut groups)?;
                let group = open
                    .take()
                    .ok_or_else(|| {
                        PatternError::UnbalancedGroup(side.to_owned())
                    })?;
                groups.push(group);
            }
            ch if ch.is_whitespace() => {
                flush(&mut name, &mut open, &mut groups)?;
            }
            ch => name.push(ch),
        }
    }
    flush(&mut name, &mut open, &mut groups)?;

    if open.is_some() {
        return Err(PatternError::UnbalancedGroup(side.to_owned()));
    }

    Ok(groups)
}

fn validate_name(name: &str) -> Result<(), PatternError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_');

    if valid {
        Ok(())
    } else {
        Err(PatternError::InvalidAxisName(name.to_owned()))
    }
}

fn ensure_unique(axes: &[String]) -> Result<(), PatternError> {
    for (i, axis) in axes.iter().enumerate() {
        if axes[..i].contains(axis) {
            return Err(PatternError::DuplicateAxis(axis.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{error::PatternError, pattern::AxisPattern};

    #[test]
    fn parses_two_operand_contraction() {
        let pattern: AxisPattern =
            "batch fields memories dim, batch fields dim \
             -> batch fields memories"
                .parse()
                .unwrap();

        assert_eq!(pattern.operand_count(), 2);
        assert!(!pattern.has_groups());
    }

    #[test]
    fn parses_output_group() {
        let pattern: AxisPattern =
            "batch mems flag -> mems (batch flag)".parse().unwrap();

        assert!(pattern.has_groups());

        let bound = pattern.bind(&[&[2, 3, 4]]).unwrap();

        assert_eq!(bound.output_shape(), vec![3, 2, 4]);
        assert_eq!(bound.grouped_shape(), vec![3, 8]);
        assert_eq!(bound.groups, vec![1, 2]);
    }

    #[test]
    fn binds_shared_labels_once() {
        let pattern: AxisPattern =
            "batch fields memories dim, batch fields dim \
             -> batch fields memories"
                .parse()
                .unwrap();

        let bound = pattern.bind(&[&[2, 3, 4, 5], &[2, 3, 5]]).unwrap();

        assert_eq!(bound.sizes, vec![2, 3, 4, 5]);
        assert_eq!(bound.operands[1], vec![0, 1, 3]);
        assert_eq!(bound.output, vec![0, 1, 2]);
        assert_eq!(bound.summed_labels(), vec![3]);
    }

    #[test]
    fn reduction_sums_missing_axes() {
        let pattern: AxisPattern =
            "batch hidden children c_mems -> batch hidden".parse().unwrap();

        let bound = pattern.bind(&[&[2, 3, 5, 6]]).unwrap();

        assert_eq!(bound.summed_labels(), vec![2, 3]);
        assert_eq!(bound.output_shape(), vec![2, 3]);
    }

    #[test]
    fn missing_arrow_is_rejected() {
        let result = "batch dim".parse::<AxisPattern>();

        assert!(matches!(result, Err(PatternError::MissingArrow(_))));
    }

    #[test]
    fn unknown_output_axis_is_rejected() {
        let result = "batch dim -> batch other".parse::<AxisPattern>();

        assert_eq!(
            result,
            Err(PatternError::UnknownOutputAxis("other".to_owned()))
        );
    }

    #[test]
    fn duplicate_axis_is_rejected() {
        let result = "batch batch -> batch".parse::<AxisPattern>();

        assert_eq!(
            result,
            Err(PatternError::DuplicateAxis("batch".to_owned()))
        );
    }

    #[test]
    fn input_groups_are_rejected() {
        let result =
            "(batch flag) mems -> mems batch flag".parse::<AxisPattern>();

        assert!(matches!(result, Err(PatternError::UnsupportedGroup(_))));
    }

    #[test]
    fn unbalanced_group_is_rejected() {
        let result = "batch flag -> (batch flag".parse::<AxisPattern>();

        assert!(matches!(result, Err(PatternError::UnbalancedGroup(_))));
    }

    #[test]
    fn conflicting_lengths_are_rejected() {
        let pattern: AxisPattern =
            "batch dim, batch dim -> batch".parse().unwrap();

        let result = pattern.bind(&[&[2, 3], &[2, 4]]);

        assert_eq!(
            result,
            Err(PatternError::ConflictingLength {
                axis: "dim".to_owned(),
                first: 3,
                second: 4,
            })
        );
    }

    #[test]
    fn rank_mismatch_is_rejected() {
        let pattern: AxisPattern = "batch dim -> batch".parse().unwrap();

        let result = pattern.bind(&[&[2, 3, 4]]);

        assert_eq!(
            result,
            Err(PatternError::RankMismatch {
                operand: 0,
                ndim: 3,
                named: 2,
            })
        );
    }
}

//! Weighted edit distance between a repair candidate and the real input.
//!
//! Inserting or deleting a terminal costs 1. A substitution costs 2, the same
//! as a deletion plus an insertion, so an alignment never prefers replacing a
//! token over simply adding or dropping one.

/// Cost of inserting one terminal
pub const INSERTION_COST: usize = 1;
/// Cost of deleting one terminal
pub const DELETION_COST: usize = 1;
/// Cost of replacing one terminal by another
pub const SUBSTITUTION_COST: usize = INSERTION_COST + DELETION_COST;

/// One step of turning the input into the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// `input[input]` is kept and matches `candidate[candidate]`
    Keep { candidate: usize, input: usize },
    /// `candidate[i]` is inserted
    Insert(usize),
    /// `input[j]` is deleted
    Delete(usize),
}

/// Minimum weighted cost of turning `input` into `candidate`.
#[must_use]
pub fn edit_distance<T: PartialEq>(candidate: &[T], input: &[T]) -> usize {
    let mut previous: Vec<usize> = (0..=input.len()).map(|j| j * DELETION_COST).collect();
    let mut current = vec![0; input.len() + 1];
    for (i, c) in candidate.iter().enumerate() {
        current[0] = (i + 1) * INSERTION_COST;
        for (j, t) in input.iter().enumerate() {
            let substitute = if c == t { 0 } else { SUBSTITUTION_COST };
            current[j + 1] = (previous[j] + substitute)
                .min(previous[j + 1] + INSERTION_COST)
                .min(current[j] + DELETION_COST);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[input.len()]
}

/// A minimum-cost alignment of `candidate` against `input`, in input order.
///
/// Matching terminals are kept whenever that is optimal; otherwise deletions
/// come before insertions at the same position, so a substitution shows up
/// as `Delete` followed by `Insert`.
#[must_use]
pub fn edit_script<T: PartialEq>(candidate: &[T], input: &[T]) -> Vec<Edit> {
    let (n, m) = (candidate.len(), input.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j * DELETION_COST;
    }
    for i in 1..=n {
        table[i][0] = i * INSERTION_COST;
        for j in 1..=m {
            let substitute = if candidate[i - 1] == input[j - 1] {
                0
            } else {
                SUBSTITUTION_COST
            };
            table[i][j] = (table[i - 1][j - 1] + substitute)
                .min(table[i - 1][j] + INSERTION_COST)
                .min(table[i][j - 1] + DELETION_COST);
        }
    }

    let mut script = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0
            && j > 0
            && candidate[i - 1] == input[j - 1]
            && table[i][j] == table[i - 1][j - 1]
        {
            i -= 1;
            j -= 1;
            script.push(Edit::Keep {
                candidate: i,
                input: j,
            });
        } else if i > 0 && table[i][j] == table[i - 1][j] + INSERTION_COST {
            i -= 1;
            script.push(Edit::Insert(i));
        } else {
            j -= 1;
            script.push(Edit::Delete(j));
        }
    }
    script.reverse();
    script
}

/// Total cost of a script
#[must_use]
pub fn script_cost(script: &[Edit]) -> usize {
    script
        .iter()
        .map(|edit| match edit {
            Edit::Keep { .. } => 0,
            Edit::Insert(_) => INSERTION_COST,
            Edit::Delete(_) => DELETION_COST,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(edit_distance(&[1, 2, 3], &[1, 2, 3]), 0);
        assert_eq!(edit_distance::<u32>(&[], &[]), 0);
    }

    #[test]
    fn test_single_substitution() {
        assert_eq!(edit_distance(&[1, 9, 3], &[1, 2, 3]), 2);
        assert_eq!(
            edit_script(&[1, 9, 3], &[1, 2, 3]),
            vec![
                Edit::Keep {
                    candidate: 0,
                    input: 0
                },
                Edit::Delete(1),
                Edit::Insert(1),
                Edit::Keep {
                    candidate: 2,
                    input: 2
                },
            ]
        );
    }

    #[test]
    fn test_single_insertion_and_deletion() {
        assert_eq!(edit_distance(&[1, 2, 3], &[1, 3]), 1);
        assert_eq!(edit_distance(&[1, 3], &[1, 2, 3]), 1);
        assert_eq!(
            edit_script(&[7, 2], &[2]),
            vec![
                Edit::Insert(0),
                Edit::Keep {
                    candidate: 1,
                    input: 0
                }
            ]
        );
        assert_eq!(edit_script(&[2], &[5, 2])[0], Edit::Delete(0));
    }

    #[test]
    fn test_against_empty() {
        assert_eq!(edit_distance(&[1, 2], &[]), 2);
        assert_eq!(edit_distance(&[], &[1, 2, 3]), 3);
    }

    #[test]
    fn test_script_cost_matches_distance() {
        let candidate = [4, 1, 1, 2, 0];
        let input = [1, 3, 2, 2];
        let script = edit_script(&candidate, &input);
        assert_eq!(script_cost(&script), edit_distance(&candidate, &input));
    }
}

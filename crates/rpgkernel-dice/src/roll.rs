//! Dice rolls, advantage/disadvantage, and degree-of-success classification.

use rand::Rng;
use rpgkernel_types::{CheckDegree, RollTrace};

use crate::error::DiceError;
use crate::rng::DeterministicRng;

/// Roll a single d20.
#[must_use]
pub fn d20(rng: &mut DeterministicRng) -> i32 {
    rng.inner_mut().random_range(1..=20)
}

/// Roll 2d20 and keep the higher result (advantage), per `spec.md` §4.A.
#[must_use]
pub fn roll_with_advantage(rng: &mut DeterministicRng) -> i32 {
    let a = d20(rng);
    let b = d20(rng);
    a.max(b)
}

/// Roll 2d20 and keep the lower result (disadvantage), per `spec.md` §4.A.
#[must_use]
pub fn roll_with_disadvantage(rng: &mut DeterministicRng) -> i32 {
    let a = d20(rng);
    let b = d20(rng);
    a.min(b)
}

/// Classify a d20-based roll against a difficulty class.
///
/// `natural` is the unmodified d20 result (pre-advantage-resolution,
/// pre-modifier); `total` is `natural`'s roll path summed with all
/// modifiers. A natural 1 is always a critical failure and a natural 20 is
/// always a critical success, regardless of `total` versus `dc`.
#[must_use]
pub const fn check_degree(natural: i32, total: i32, dc: i32) -> CheckDegree {
    if natural == 1 {
        return CheckDegree::CriticalFailure;
    }
    if natural == 20 {
        return CheckDegree::CriticalSuccess;
    }
    if total <= dc.saturating_sub(10) {
        CheckDegree::CriticalFailure
    } else if total >= dc.saturating_add(10) {
        CheckDegree::CriticalSuccess
    } else if total >= dc {
        CheckDegree::Success
    } else {
        CheckDegree::Failure
    }
}

/// Parse and roll a dice expression of the form `NdM`, `NdM+K`, or `NdM-K`
/// (e.g. `"2d6+3"`), returning a full [`RollTrace`].
///
/// # Errors
/// Returns [`DiceError`] if the expression is empty, malformed, requests a
/// non-positive count/side count, or exceeds [`DiceError::MAX_DICE`].
pub fn roll_expr(rng: &mut DeterministicRng, expr: &str) -> Result<RollTrace, DiceError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(DiceError::EmptyExpression);
    }

    let (count, sides, modifier) = parse_expr(trimmed)?;

    if count == 0 || sides == 0 {
        return Err(DiceError::NonPositiveTerm(trimmed.to_owned()));
    }
    if count > DiceError::MAX_DICE {
        return Err(DiceError::TooManyDice(trimmed.to_owned()));
    }

    let dice: Vec<i32> = (0..count)
        .map(|_| {
            let value: u32 = rng.inner_mut().random_range(1..=sides);
            i32::try_from(value).unwrap_or(i32::MAX)
        })
        .collect();
    let sum: i32 = dice.iter().sum();
    let total = sum.saturating_add(modifier);

    Ok(RollTrace {
        expression: trimmed.to_owned(),
        dice,
        modifier,
        total,
    })
}

/// Splits `"2d6+3"` into `(2, 6, 3)`, `"1d20-1"` into `(1, 20, -1)`, and
/// `"4d8"` into `(4, 8, 0)`.
fn parse_expr(expr: &str) -> Result<(u32, u32, i32), DiceError> {
    let lower = expr.to_ascii_lowercase();
    let Some(d_pos) = lower.find('d') else {
        return Err(DiceError::MalformedExpression(expr.to_owned()));
    };

    let count_str = &lower[..d_pos];
    let rest = &lower[d_pos + 1..];

    let (sides_str, modifier): (&str, i32) = if let Some(plus_pos) = rest.find('+') {
        let modifier = rest[plus_pos + 1..]
            .parse::<i32>()
            .map_err(|_err| DiceError::MalformedExpression(expr.to_owned()))?;
        (&rest[..plus_pos], modifier)
    } else if let Some(minus_pos) = rest.find('-') {
        let modifier = rest[minus_pos + 1..]
            .parse::<i32>()
            .map_err(|_err| DiceError::MalformedExpression(expr.to_owned()))?;
        (&rest[..minus_pos], modifier.saturating_neg())
    } else {
        (rest, 0)
    };

    let count = count_str
        .parse::<u32>()
        .map_err(|_err| DiceError::MalformedExpression(expr.to_owned()))?;
    let sides = sides_str
        .parse::<u32>()
        .map_err(|_err| DiceError::MalformedExpression(expr.to_owned()))?;

    Ok((count, sides, modifier))
}

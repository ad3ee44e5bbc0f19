//! The built-in function table.
//!
//! Arguments are passed unevaluated so that `if` evaluates only the branch
//! it takes and list functions can evaluate their expression argument once
//! per element.

use std::cmp::Ordering;

use crate::{
    ast::{Builtin, Expr},
    callable::Callable,
    evaluator::{EvalError, Evaluator},
    hex::{self, Location},
    scope::BindingScope,
    value::Value,
};

impl Evaluator {
    pub(crate) fn call_builtin(
        &self,
        function: Builtin,
        args: &[Expr],
        env: &dyn Callable,
    ) -> Result<Value, EvalError> {
        // Parsed calls already passed this check; hand-built trees may not have.
        let arity = function.arity();
        if !arity.accepts(args.len()) {
            return Err(EvalError::InvalidArgument {
                function: function.name(),
                reason: format!("expected {} arguments, got {}", arity.describe(), args.len()),
            });
        }

        match function {
            Builtin::If => {
                let branch = if self.eval(&args[0], env)?.as_bool()? { 1 } else { 2 };
                self.eval(&args[branch], env)
            }
            Builtin::Abs => {
                let n = self.int_arg(function, &args[0], env)?;
                n.checked_abs()
                    .map(Value::Integer)
                    .ok_or(EvalError::Overflow("abs"))
            }
            Builtin::Min => self.builtin_extreme(args, env, Ordering::Less),
            Builtin::Max => self.builtin_extreme(args, env, Ordering::Greater),
            Builtin::Choose => self.builtin_choose(args, env),
            Builtin::Sort => self.builtin_sort(args, env),
            Builtin::Filter => {
                let items = self.list_arg(function, &args[0], env)?;
                let mut kept = Vec::new();
                for item in items {
                    if self.eval_for_element(&args[1], &item, env)?.as_bool()? {
                        kept.push(item);
                    }
                }
                Ok(Value::List(kept))
            }
            Builtin::Find => {
                let items = self.list_arg(function, &args[0], env)?;
                for item in items {
                    if self.eval_for_element(&args[1], &item, env)?.as_bool()? {
                        return Ok(item);
                    }
                }
                Ok(Value::default())
            }
            Builtin::Map => {
                let items = self.list_arg(function, &args[0], env)?;
                items
                    .iter()
                    .map(|item| self.eval_for_element(&args[1], item, env))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            Builtin::Sum => {
                let items = self.list_arg(function, &args[0], env)?;
                let mut total: i64 = 0;
                for item in &items {
                    let n = item
                        .as_int()
                        .map_err(|_| EvalError::type_error("integer", item, "sum"))?;
                    total = total.checked_add(n).ok_or(EvalError::Overflow("sum"))?;
                }
                Ok(Value::Integer(total))
            }
            Builtin::Head => {
                let list = self.eval(&args[0], env)?;
                list.element(0).cloned()
            }
            Builtin::Size => {
                let items = self.list_arg(function, &args[0], env)?;
                Ok(Value::Integer(items.len() as i64))
            }
            Builtin::Rgb => {
                let mut packed = 0;
                for arg in args {
                    packed = packed * 100 + self.int_arg(function, arg, env)?.clamp(0, 99);
                }
                Ok(Value::Integer(packed))
            }
            Builtin::Transition => {
                let [value, begin, val1, end, val2] = self.int_args::<5>(function, args, env)?;
                transition(begin, val1, end, val2, value).map(Value::Integer)
            }
            Builtin::ColorTransition => self.builtin_color_transition(args, env),
            Builtin::Loc => {
                let x = self.int_arg(function, &args[0], env)?;
                let y = self.int_arg(function, &args[1], env)?;
                Ok(Value::object(Location::new(x, y)))
            }
            Builtin::Distance => {
                let a = self.location_arg(&args[0], env)?;
                let b = self.location_arg(&args[1], env)?;
                hex::checked_distance_between(a, b)
                    .map(Value::Integer)
                    .ok_or(EvalError::Overflow("distance"))
            }
        }
    }

    fn int_arg(&self, function: Builtin, arg: &Expr, env: &dyn Callable) -> Result<i64, EvalError> {
        let value = self.eval(arg, env)?;
        value
            .as_int()
            .map_err(|_| EvalError::type_error("integer", &value, function.name()))
    }

    fn int_args<const N: usize>(
        &self,
        function: Builtin,
        args: &[Expr],
        env: &dyn Callable,
    ) -> Result<[i64; N], EvalError> {
        let mut out = [0; N];
        for (slot, arg) in out.iter_mut().zip(args) {
            *slot = self.int_arg(function, arg, env)?;
        }
        Ok(out)
    }

    fn list_arg(
        &self,
        function: Builtin,
        arg: &Expr,
        env: &dyn Callable,
    ) -> Result<Vec<Value>, EvalError> {
        match self.eval(arg, env)? {
            Value::List(items) => Ok(items),
            other => Err(EvalError::type_error("list", &other, function.name())),
        }
    }

    fn location_arg(&self, arg: &Expr, env: &dyn Callable) -> Result<Location, EvalError> {
        let value = self.eval(arg, env)?;
        let location = match &value {
            Value::Object(obj) => obj
                .as_any()
                .and_then(|any| any.downcast_ref::<Location>())
                .copied(),
            _ => None,
        };
        location.ok_or_else(|| EvalError::type_error("location", &value, "distance"))
    }

    /// Evaluate `expr` for one list element: inside the element when it is an
    /// object, otherwise with the element bound to `value`.
    fn eval_for_element(
        &self,
        expr: &Expr,
        element: &Value,
        env: &dyn Callable,
    ) -> Result<Value, EvalError> {
        match element {
            Value::Object(obj) => self.eval(expr, &**obj),
            other => {
                let scope = BindingScope::new(env).bind("value", other.clone());
                self.eval(expr, &scope)
            }
        }
    }

    /// Running minimum or maximum over scalar arguments and the elements of
    /// list arguments. Nothing to compare yields 0.
    fn builtin_extreme(
        &self,
        args: &[Expr],
        env: &dyn Callable,
        wanted: Ordering,
    ) -> Result<Value, EvalError> {
        let mut best: Option<Value> = None;
        let mut consider = |candidate: Value| -> Result<(), EvalError> {
            let replace = match &best {
                None => true,
                Some(current) => candidate.compare(current)? == wanted,
            };
            if replace {
                best = Some(candidate);
            }
            Ok(())
        };

        for arg in args {
            match self.eval(arg, env)? {
                Value::List(items) => {
                    for item in items {
                        consider(item)?;
                    }
                }
                scalar => consider(scalar)?,
            }
        }

        Ok(best.unwrap_or_default())
    }

    /// The element with the greatest score; the first one wins ties.
    fn builtin_choose(&self, args: &[Expr], env: &dyn Callable) -> Result<Value, EvalError> {
        let items = self.list_arg(Builtin::Choose, &args[0], env)?;
        let mut best: Option<(Value, usize)> = None;

        for (index, item) in items.iter().enumerate() {
            let score = self.eval_for_element(&args[1], item, env)?;
            let better = match &best {
                None => true,
                Some((best_score, _)) => score.compare(best_score)? == Ordering::Greater,
            };
            if better {
                best = Some((score, index));
            }
        }

        Ok(best
            .and_then(|(_, index)| items.into_iter().nth(index))
            .unwrap_or_default())
    }

    fn builtin_sort(&self, args: &[Expr], env: &dyn Callable) -> Result<Value, EvalError> {
        let items = self.list_arg(Builtin::Sort, &args[0], env)?;

        let sorted = match args.get(1) {
            None => merge_sort(items, &mut |a: &Value, b: &Value| {
                Ok(a.compare(b)? == Ordering::Less)
            })?,
            Some(comparator) => merge_sort(items, &mut |a: &Value, b: &Value| {
                let scope = BindingScope::new(env)
                    .bind("a", a.clone())
                    .bind("b", b.clone());
                self.eval(comparator, &scope)?.as_bool()
            })?,
        };

        Ok(Value::List(sorted))
    }

    fn builtin_color_transition(
        &self,
        args: &[Expr],
        env: &dyn Callable,
    ) -> Result<Value, EvalError> {
        let function = Builtin::ColorTransition;
        let values = args
            .iter()
            .map(|arg| self.int_arg(function, arg, env))
            .collect::<Result<Vec<_>, _>>()?;
        let value = values[0];

        // values = [value, b0, c0, b1, c1, ...]
        let breakpoints: Vec<(i64, i64)> = values[1..]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();

        if breakpoints.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(EvalError::InvalidArgument {
                function: function.name(),
                reason: "boundaries must be strictly increasing".to_string(),
            });
        }

        let segment = breakpoints
            .windows(2)
            .find(|w| value >= w[0].0 && value <= w[1].0);
        let Some(&[(begin, color1), (end, color2)]) = segment else {
            return Ok(Value::Integer(0));
        };

        let mut packed = 0;
        for scale in [10000, 100, 1] {
            let c1 = (color1 / scale) % 100;
            let c2 = (color2 / scale) % 100;
            let channel = transition(begin, c1, end, c2, value)?;
            packed = packed * 100 + channel.clamp(0, 99);
        }
        Ok(Value::Integer(packed))
    }
}

/// Linear interpolation between `(begin, val1)` and `(end, val2)`, exact at
/// both ends and 0 outside the range.
fn transition(begin: i64, val1: i64, end: i64, val2: i64, value: i64) -> Result<i64, EvalError> {
    if value < begin || value > end {
        return Ok(0);
    }
    if value == begin {
        return Ok(val1);
    }
    if value == end {
        return Ok(val2);
    }

    let overflow = || EvalError::Overflow("transition");
    let to_end = end.checked_sub(value).ok_or_else(overflow)?;
    let from_begin = value.checked_sub(begin).ok_or_else(overflow)?;
    let span = end.checked_sub(begin).ok_or_else(overflow)?;
    let comp1 = val1.checked_mul(to_end).ok_or_else(overflow)?;
    let comp2 = val2.checked_mul(from_begin).ok_or_else(overflow)?;
    let sum = comp1.checked_add(comp2).ok_or_else(overflow)?;
    Ok(sum / span)
}

/// Stable merge sort driven by a fallible "comes before" test.
fn merge_sort<F>(mut items: Vec<Value>, less: &mut F) -> Result<Vec<Value>, EvalError>
where
    F: FnMut(&Value, &Value) -> Result<bool, EvalError>,
{
    if items.len() <= 1 {
        return Ok(items);
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, less)?;
    let right = merge_sort(right, less)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if less(&right[j], &left[i])? {
            merged.push(right[j].clone());
            j += 1;
        } else {
            merged.push(left[i].clone());
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    Ok(merged)
}

// tests/builtin_tests.rs

use std::cell::RefCell;
use std::rc::Rc;

use formula_lang::{Callable, EvalError, MapCallable, Value, compile};
use pretty_assertions::assert_eq;

fn eval(source: &str) -> Value {
    try_eval(source).unwrap()
}

fn try_eval(source: &str) -> Result<Value, EvalError> {
    compile(source).unwrap().try_execute(&MapCallable::new())
}

fn ints(values: &[i64]) -> Value {
    Value::List(values.iter().map(|&n| Value::Integer(n)).collect())
}

fn member(name: &str, strength: i64) -> Value {
    Value::object(MapCallable::new().add("name", name).add("strength", strength))
}

fn party() -> MapCallable {
    MapCallable::new().add(
        "members",
        Value::List(vec![member("Ana", 9), member("Bo", 14), member("Cy", 14), member("Di", 3)]),
    )
}

/// Records every attribute it is asked for.
#[derive(Default)]
struct Recorder {
    queried: RefCell<Vec<String>>,
}

impl Callable for Recorder {
    fn get(&self, key: &str) -> Value {
        self.queried.borrow_mut().push(key.to_string());
        match key {
            "strength" => Value::Integer(15),
            _ => Value::Integer(1),
        }
    }
}

// ============================================================================
// if
// ============================================================================

#[test]
fn test_if_takes_branch() {
    let env = MapCallable::new().add("strength", 15);
    let formula = compile("if(strength > 12, 7, 2)").unwrap();
    assert_eq!(formula.execute(&env), Value::Integer(7));
}

#[test]
fn test_if_evaluates_only_taken_branch() {
    let env = Recorder::default();
    let formula = compile("if(strength > 12, taken, untaken)").unwrap();
    assert_eq!(formula.try_execute(&env), Ok(Value::Integer(1)));

    let queried = env.queried.borrow();
    assert!(queried.contains(&"taken".to_string()));
    assert!(!queried.contains(&"untaken".to_string()));
}

#[test]
fn test_if_skips_failing_branch() {
    assert_eq!(eval("if(0, 1/0, 3)"), Value::Integer(3));
}

// ============================================================================
// abs, min, max
// ============================================================================

#[test]
fn test_abs() {
    assert_eq!(eval("abs(-5)"), Value::Integer(5));
    assert_eq!(eval("abs(5)"), Value::Integer(5));
    assert!(matches!(try_eval("abs('x')"), Err(EvalError::TypeError { .. })));
}

#[test]
fn test_min_max_flatten_lists() {
    assert_eq!(eval("min(4,5,[2,18,7])"), Value::Integer(2));
    assert_eq!(eval("max(4,5,[2,18,7])"), Value::Integer(18));
}

#[test]
fn test_min_max_of_nothing() {
    assert_eq!(eval("min([])"), Value::Integer(0));
    assert_eq!(eval("max([], [])"), Value::Integer(0));
}

#[test]
fn test_min_of_strings() {
    assert_eq!(eval("min('pear', 'apple')"), Value::from("apple"));
}

#[test]
fn test_min_of_mixed_kinds_fails() {
    assert!(matches!(try_eval("min(1, 'a')"), Err(EvalError::TypeError { .. })));
}

// ============================================================================
// List functions
// ============================================================================

#[test]
fn test_sort_natural() {
    assert_eq!(eval("sort([3,1,2])"), ints(&[1, 2, 3]));
    assert_eq!(
        eval("sort(['b', 'c', 'a'])"),
        Value::List(vec!["a".into(), "b".into(), "c".into()])
    );
}

#[test]
fn test_sort_with_comparator() {
    assert_eq!(eval("sort([3,1,2], a < b)"), ints(&[1, 2, 3]));
    assert_eq!(eval("sort([3,1,2], a > b)"), ints(&[3, 2, 1]));
}

#[test]
fn test_sort_comparator_matches_natural_order() {
    let natural = eval("sort([5, 3, 9, 1, 3, 7, 0])");
    let custom = eval("sort([5, 3, 9, 1, 3, 7, 0], a < b)");
    assert_eq!(natural, custom);
}

#[test]
fn test_sort_comparator_sees_environment() {
    let env = MapCallable::new().add("pivot", 5);
    let formula = compile("sort([7, 1, 6, 2], abs(a - pivot) < abs(b - pivot))").unwrap();
    assert_eq!(formula.try_execute(&env), Ok(ints(&[6, 7, 2, 1])));
}

#[test]
fn test_sort_objects_by_attribute() {
    let sorted = compile("map(sort(members, a.strength > b.strength), name)")
        .unwrap()
        .try_execute(&party())
        .unwrap();
    assert_eq!(
        sorted,
        Value::List(vec!["Bo".into(), "Cy".into(), "Ana".into(), "Di".into()])
    );
}

#[test]
fn test_sort_errors_propagate() {
    assert!(matches!(try_eval("sort([1, 'a'])"), Err(EvalError::TypeError { .. })));
    assert_eq!(try_eval("sort([1, 2], a / 0)"), Err(EvalError::DivisionByZero));
}

#[test]
fn test_filter_preserves_order() {
    assert_eq!(eval("filter([1,2,3,4], value % 2 = 0)"), ints(&[2, 4]));
    assert_eq!(eval("filter([4,3,2,1], value > 1)"), ints(&[4, 3, 2]));
}

#[test]
fn test_filter_objects() {
    let strong = compile("map(filter(members, strength > 8), name)")
        .unwrap()
        .try_execute(&party())
        .unwrap();
    assert_eq!(strong, Value::List(vec!["Ana".into(), "Bo".into(), "Cy".into()]));
}

#[test]
fn test_find() {
    assert_eq!(eval("find([1,2,3,4], value > 2)"), Value::Integer(3));
    assert_eq!(eval("find([1,2], value > 5)"), Value::Integer(0));
    let found = compile("find(members, strength < 5).name")
        .unwrap()
        .try_execute(&party())
        .unwrap();
    assert_eq!(found, Value::from("Di"));
}

#[test]
fn test_map() {
    assert_eq!(eval("map([1,2,3], value * value)"), ints(&[1, 4, 9]));
    assert_eq!(eval("map([], value)"), Value::List(vec![]));
}

#[test]
fn test_element_scope_falls_back_to_environment() {
    let env = MapCallable::new().add("bonus", 10);
    let formula = compile("map([1, 2], value + bonus)").unwrap();
    assert_eq!(formula.try_execute(&env), Ok(ints(&[11, 12])));
}

#[test]
fn test_choose() {
    let chosen = compile("choose(members, strength).name")
        .unwrap()
        .try_execute(&party())
        .unwrap();
    // Bo and Cy tie; the first one wins.
    assert_eq!(chosen, Value::from("Bo"));
    assert_eq!(eval("choose([3, 9, 4], value)"), Value::Integer(9));
    assert_eq!(eval("choose([3, 9, 4], 0 - value)"), Value::Integer(3));
    assert_eq!(eval("choose([], value)"), Value::Integer(0));
}

#[test]
fn test_sum_head_size() {
    assert_eq!(eval("sum([1, 2, 3, 4])"), Value::Integer(10));
    assert_eq!(eval("sum([])"), Value::Integer(0));
    assert_eq!(eval("head([7, 8])"), Value::Integer(7));
    assert_eq!(eval("size([7, 8, 9])"), Value::Integer(3));
    assert_eq!(eval("size([])"), Value::Integer(0));
}

#[test]
fn test_head_of_empty_list() {
    assert_eq!(
        try_eval("head([])"),
        Err(EvalError::IndexOutOfRange { index: 0, len: 0 })
    );
}

#[test]
fn test_list_functions_need_lists() {
    for source in ["sum(3)", "size('abc')", "filter(1, value)", "map('x', value)"] {
        assert!(
            matches!(try_eval(source), Err(EvalError::TypeError { .. })),
            "{} should be a type error",
            source
        );
    }
    assert!(matches!(try_eval("sum(['a'])"), Err(EvalError::TypeError { .. })));
}

// ============================================================================
// Colors and transitions
// ============================================================================

#[test]
fn test_rgb_packs_and_clamps() {
    assert_eq!(eval("rgb(10, 20, 30)"), Value::Integer(102030));
    assert_eq!(eval("rgb(150, -4, 99)"), Value::Integer(990099));
}

#[test]
fn test_transition() {
    assert_eq!(eval("transition(0, 0, 10, 100, 20)"), Value::Integer(10));
    assert_eq!(eval("transition(100, 0, 10, 100, 20)"), Value::Integer(20));
    assert_eq!(eval("transition(50, 0, 10, 100, 20)"), Value::Integer(15));
    assert_eq!(eval("transition(150, 0, 10, 100, 20)"), Value::Integer(0));
    assert_eq!(eval("transition(-1, 0, 10, 100, 20)"), Value::Integer(0));
}

#[test]
fn test_transition_with_extreme_bounds() {
    assert_eq!(
        try_eval("transition(0, 0-9223372036854775807-1, 0, 9223372036854775807, 0)"),
        Err(EvalError::Overflow("transition"))
    );
    let formula = compile("transition(0, 0-9223372036854775807-1, 0, 9223372036854775807, 0)")
        .unwrap();
    assert_eq!(formula.execute(&MapCallable::new()), Value::Integer(0));
}

#[test]
fn test_color_transition_interpolates_channels() {
    // From rgb(0, 50, 99) at 0 to rgb(20, 0, 99) at 10.
    let source = "color_transition(5, 0, rgb(0, 50, 99), 10, rgb(20, 0, 99))";
    assert_eq!(eval(source), Value::Integer(102599));
}

#[test]
fn test_color_transition_finds_segment() {
    let source = "color_transition(t, 0, rgb(0,0,0), 10, rgb(10,10,10), 20, rgb(30,30,30))";
    let formula = compile(source).unwrap();
    let at = |t: i64| formula.try_execute(&MapCallable::new().add("t", t)).unwrap();
    assert_eq!(at(0), Value::Integer(0));
    assert_eq!(at(10), Value::Integer(101010));
    assert_eq!(at(15), Value::Integer(202020));
    assert_eq!(at(20), Value::Integer(303030));
    assert_eq!(at(25), Value::Integer(0));
    assert_eq!(at(-5), Value::Integer(0));
}

#[test]
fn test_color_transition_rejects_unordered_boundaries() {
    let result = try_eval("color_transition(5, 10, 0, 0, 0, 20, 0)");
    assert!(matches!(
        result,
        Err(EvalError::InvalidArgument { function: "color_transition", .. })
    ));
    assert!(try_eval("color_transition(5, 0, 0, 0, 0)").is_err());
}

// ============================================================================
// Locations
// ============================================================================

#[test]
fn test_loc_attributes() {
    assert_eq!(eval("loc(3, 4).x"), Value::Integer(3));
    assert_eq!(eval("loc(3, 4).y"), Value::Integer(4));
    assert_eq!(eval("loc(3, 4).valid"), Value::Integer(1));
    assert_eq!(eval("loc(-1, 4).valid"), Value::Integer(0));
}

#[test]
fn test_distance() {
    assert_eq!(eval("distance(loc(0,0), loc(1,0))"), Value::Integer(1));
    assert_eq!(eval("distance(loc(0,0), loc(1,1))"), Value::Integer(2));
    assert_eq!(eval("distance(loc(2,2), loc(2,2))"), Value::Integer(0));
    assert_eq!(eval("distance(loc(0,0), loc(0,5))"), Value::Integer(5));
}

#[test]
fn test_distance_across_extreme_coordinates() {
    assert_eq!(
        try_eval("distance(loc(0-9223372036854775807-1, 0), loc(1, 0))"),
        Err(EvalError::Overflow("distance"))
    );
    assert_eq!(
        eval("distance(loc(0-9223372036854775807-1, 0), loc(0-9223372036854775807+1, 0))"),
        Value::Integer(2)
    );
}

#[test]
fn test_distance_needs_locations() {
    assert!(matches!(
        try_eval("distance(1, loc(0,0))"),
        Err(EvalError::TypeError { .. })
    ));
    let env = MapCallable::new().add("thing", Value::object(MapCallable::new()));
    let formula = compile("distance(thing, loc(0,0))").unwrap();
    assert!(formula.try_execute(&env).is_err());
}

#[test]
fn test_shared_object_identity() {
    let hero: Rc<dyn Callable> = Rc::new(MapCallable::new().add("hp", 3));
    let env = MapCallable::new()
        .add("a", Value::Object(Rc::clone(&hero)))
        .add("b", Value::Object(Rc::clone(&hero)))
        .add("c", Value::object(MapCallable::new().add("hp", 3)));
    assert_eq!(compile("a = b").unwrap().try_execute(&env), Ok(Value::Integer(1)));
    assert_eq!(compile("a = c").unwrap().try_execute(&env), Ok(Value::Integer(0)));
}

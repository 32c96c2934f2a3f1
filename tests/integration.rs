//! Integration test: run feature files via cargo test
//!
//! This test discovers and runs all `.feature` files in `tests/features/`
//! against the step definitions registered below.
//!
//! Usage:
//!   cargo test --test integration                          # run all
//!   EMX_GHERKIN_VERBOSE=1 cargo test --test integration    # with step trace
//!
//! Environment variables:
//!   EMX_GHERKIN_VERBOSE=1  print the per-step trace

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use emx_gherkin::Engine;

fn features_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features")
}

fn parse_num(s: &str) -> Result<i64, String> {
    s.parse().map_err(|e| format!("not a number {:?}: {}", s, e))
}

fn register_cucumbers(engine: &mut Engine) {
    let basket = Rc::new(RefCell::new(0i64));

    let b = basket.clone();
    engine
        .given("^an empty basket$", move |_| {
            *b.borrow_mut() = 0;
            Ok(())
        })
        .unwrap();
    let b = basket.clone();
    engine
        .given(r"^there are (\d+) cucumbers$", move |w| {
            *b.borrow_mut() = parse_num(&w.capture()?)?;
            Ok(())
        })
        .unwrap();
    let b = basket.clone();
    engine
        .when(r"^I eat (\d+) cucumbers$", move |w| {
            *b.borrow_mut() -= parse_num(&w.capture()?)?;
            Ok(())
        })
        .unwrap();
    let b = basket;
    engine
        .then(r"^I should have (\d+) cucumbers$", move |w| {
            let expected = parse_num(&w.capture()?)?;
            w.check_eq(*b.borrow(), expected);
            Ok(())
        })
        .unwrap();
}

fn register_people(engine: &mut Engine) {
    let book: Rc<RefCell<Vec<(String, String)>>> = Rc::default();

    let b = book.clone();
    engine
        .given("^these people$", move |w| {
            let mut book = b.borrow_mut();
            book.clear();
            for row in w.table() {
                book.push((row["name"].clone(), row["email"].clone()));
            }
            Ok(())
        })
        .unwrap();
    let b = book.clone();
    engine
        .then(r"^the address book has (\d+) entries$", move |w| {
            let expected = parse_num(&w.capture()?)? as usize;
            w.check_eq(b.borrow().len(), expected);
            Ok(())
        })
        .unwrap();
    let b = book;
    engine
        .then(r"^the address book contains (\S+)$", move |w| {
            let email = w.capture()?;
            if !b.borrow().iter().any(|(_, e)| *e == email) {
                w.fail(format!("{} not found", email));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn features_all() {
    emx_gherkin::run_and_assert_with(features_dir(), |engine| {
        register_cucumbers(engine);
        register_people(engine);
    });
}

#[test]
fn features_totals() {
    let mut engine = Engine::new();
    register_cucumbers(&mut engine);
    register_people(&mut engine);

    let result = emx_gherkin::run(features_dir()).engine(engine).run().unwrap();
    let total = result.total();
    // cucumbers: 3 scenarios x (1 background + 3 steps); people: 1 x 3 steps
    assert_eq!(total.scenario_count, 4);
    assert_eq!(total.passed_steps, 15);
    assert!(result.all_passed());
}

#[test]
fn features_dry_run_reports_undefined() {
    let result = emx_gherkin::run(features_dir()).run().unwrap();
    let total = result.total();
    assert_eq!(total.passed_steps, 0);
    assert_eq!(total.undefined_steps, 15);
    assert!(!result.all_passed());
}

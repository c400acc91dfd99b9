use reckon_macros::reckon_fn;
use reckon_rs::engine::EngineError;
use reckon_rs::Calculator;

#[reckon_fn]
fn hypot(a: f64, b: f64) -> f64 {
    a.hypot(b)
}

fn main() {
    pretty_env_logger::init();

    let calculator = Calculator::new();
    calculator
        .registry()
        .write()
        .register_builtin("hypot", HYPOT_ARITY, hypot);

    calculator.define("square", ["x"], "x * x");
    calculator.define("area", ["w", "h"], "w * h");
    calculator.define("diag", ["w", "h"], "sqrt ( square ( w ) + square ( h ) )");

    println!("functions: {}", calculator.list_functions().join(", "));

    for expression in ["square ( 7 )", "area ( 3 4 ) + 1", "diag ( 3 4 )", "hypot ( 5 12 )"] {
        match calculator.evaluate(expression, true, None) {
            Ok(result) => println!("{} = {}", expression, result),
            Err(err) => println!("{} -> Error! {}", expression, err),
        }
    }

    // redefinition replaces the previous body
    calculator.define("square", ["x"], "x ^ 2 + 0");
    println!("square ( 9 ) = {:?}", calculator.evaluate("square ( 9 )", true, None));

    calculator.define("forever", ["x"], "forever ( x )");
    println!("forever ( 1 ) = {:?}", calculator.evaluate("forever ( 1 )", true, None));
}

use reckon_rs::{Calculator, Tokens};

fn main() {
    pretty_env_logger::init();

    let calculator = Calculator::new();
    calculator.define("avg", ["a", "b"], "( a + b ) / 2");

    let expressions: Vec<Tokens> = (1..=8)
        .map(|i| Tokens::from(format!("avg ( {} {} ) + {} %", i * 10, i * 30, i)))
        .collect();

    let results = calculator.evaluate_batch(&expressions);
    for (i, (expression, result)) in expressions.iter().zip(results).enumerate() {
        match result {
            Ok(value) => println!("Result {}: {} = {}", i, expression.join(), value),
            Err(err) => println!("Result {}: {} -> {}", i, expression.join(), err),
        }
    }
}

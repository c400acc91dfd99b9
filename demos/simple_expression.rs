use reckon_rs::{Calculator, Context};

fn main() {
    pretty_env_logger::init();

    let calculator = Calculator::new();

    let expressions = [
        "3 + 4 * 2 / ( 1 - 5 ) ^ 2 ^ 3",
        "100 + 10 %",
        "sqrt ( 16 ) + abs ( -3 )",
        "10 % 3",
    ];
    for expression in expressions {
        println!("{}", expression);
        println!("  postfix: {}", calculator.convert(expression).join(" "));
        match calculator.evaluate(expression, true, None) {
            Ok(result) => println!("  result:  {}", result),
            Err(err) => println!("  error:   {}", err),
        }
    }

    let context = Context::from([("price".to_string(), 120.0), ("rate".to_string(), 8.0)]);
    match calculator.evaluate("price + rate %", true, Some(&context)) {
        Ok(result) => println!("price + rate % = {}", result),
        Err(err) => println!("Error: {}", err),
    }
}

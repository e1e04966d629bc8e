use log::info;
use yal::{Config, EvaluationContext};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::var("YAL_CONFIG") {
        Ok(path) => Config::from_json(&std::fs::read_to_string(path)?)?,
        Err(_) => Config::default(),
    };
    info!("starting with {:?}", config);

    let program = vec![
        "(fn! spam () (* eggs 3))",
        "(spam)",
        "(global! eggs 20)",
        "(spam)",
        "(macro! unless (c body) (list 'if c nil body))",
        "(unless (> eggs 10) (write \"few eggs\"))",
        "(global! L '(3 4 5))",
        "`(1 2 ,@L)",
        "(try (/ eggs 0) e (cdr e))",
        "(write (apply '+ (range 1 10)))",
    ];

    let mut context = EvaluationContext::with_config(config);
    for (lineno, line) in program.into_iter().enumerate() {
        let result = context.evaluate_str(line);
        println!("{}: {}", lineno, context.display(&result));
    }
    println!("output: {:?}", context.take_output());

    Ok(())
}

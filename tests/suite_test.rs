use jsonfields::path::{find, Dialect};
use serde::Deserialize;
use serde_json::Value;
use std::fs;

#[derive(Deserialize)]
struct TestSuite {
    name: String,
    dialect: String,
    document: Value,
    cases: Vec<TestCase>,
}

#[derive(Deserialize)]
struct TestCase {
    source: String,
    #[serde(default)]
    found: Option<Value>,
}

#[test]
fn suites() -> Result<(), std::io::Error> {
    let test_files = fs::read_dir("tests/suites")?;
    for entry in test_files {
        let path = entry?.path();
        println!("{:?}", &path);
        let file = fs::read(path)?;
        let suites: Vec<TestSuite> = serde_json::from_slice(&file)?;

        for suite in suites {
            if suite.dialect.parse::<Dialect>().is_err() {
                println!("{}: dialect not compiled in, skipping", suite.name);
                continue;
            }

            for (i, case) in suite.cases.into_iter().enumerate() {
                println!("{}/{}: {}", suite.name, i, case.source);
                let result = find(&case.source, &suite.document, Some(suite.dialect.as_str()));
                match case.found {
                    Some(expected) => assert_eq!(*result.unwrap(), expected),
                    None => assert!(result.unwrap_err().is_not_found()),
                }
            }
        }
    }

    Ok(())
}

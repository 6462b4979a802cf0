use log::info;
use serde_derive::Deserialize;
use std::io;
use std::path::PathBuf;

use crate::error::Result;
use crate::parser;
use crate::translate::Translator;

const DEFAULT_MODULE: &str = "JavaProgram";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub module: String,
    pub isolate: bool,
    pub dump_classes: bool,
}

type Bytes = Box<[u8]>;

impl Default for Config {
    fn default() -> Config {
        Config {
            inputs: Vec::new(),
            module: DEFAULT_MODULE.to_owned(),
            isolate: false,
            dump_classes: false,
        }
    }
}

impl Config {
    pub fn new(path: PathBuf) -> Config {
        Config {
            inputs: vec![path],
            ..Config::default()
        }
    }
}

pub fn transform_files(data: Vec<Bytes>, config: Config) -> Result<Vec<u8>> {
    info!("parsing {} class files", data.len());
    let classes = data.iter().map(|buf| parser::parse(buf)).collect::<Result<Vec<_>>>()?;
    if config.dump_classes {
        return Ok(serde_json::to_vec_pretty(&classes).map_err(io::Error::from)?);
    }
    let module = Translator::new(config.module, config.isolate).translate(classes)?;
    info!("translated module {} with {} types", module.name, module.types.len());
    Ok(serde_json::to_vec_pretty(&module).map_err(io::Error::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};
    use crate::testing::ClassBuilder;
    use matches::assert_matches;
    use noak::AccessFlags;

    fn hello() -> Bytes {
        let mut builder = ClassBuilder::new("Hello", Some("java/lang/Object"), AccessFlags::PUBLIC);
        let code = builder.code(1, &[0xB1], &[], &[]);
        builder.method(AccessFlags::PUBLIC | AccessFlags::STATIC, "main", "([Ljava/lang/String;)V", &[code]);
        builder.build().into_boxed_slice()
    }

    #[test]
    fn config_defaults() {
        let config: Config = toml::from_str("inputs = [\"a.jar\"]").unwrap();
        assert_eq!(config.module, "JavaProgram");
        assert_eq!(config.inputs, vec![PathBuf::from("a.jar")]);
        assert!(!config.isolate && !config.dump_classes);
        let config: Config = toml::from_str("module = \"Demo\"\nisolate = true").unwrap();
        assert_eq!(config.module, "Demo");
        assert!(config.isolate);
    }

    #[test]
    fn dumps_module_as_json() {
        let output = transform_files(vec![hello()], Config::default()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["name"], "JavaProgram");
        assert_eq!(value["types"][0]["name"], "Hello");
        assert_eq!(value["types"][0]["methods"][0]["body"]["instructions"][0][1], "Ret");
    }

    #[test]
    fn dumps_parsed_classes() {
        let config = Config {
            dump_classes: true,
            ..Config::default()
        };
        let output = transform_files(vec![hello()], config).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value[0]["name"], "Hello");
        assert_eq!(value[0]["super_class"], "java/lang/Object");
    }

    #[test]
    fn malformed_input_aborts_batch() {
        let data = vec![hello(), vec![0, 1, 2, 3].into_boxed_slice()];
        assert_matches!(
            transform_files(data, Config::default()),
            Err(Error::Format(FormatError::BadMagic(_)))
        );
    }
}

use clap::clap_app;
use glob::glob;
use log::{debug, LevelFilter};
use std::fs::File;
use std::io;
use std::io::{Read, Write};
use std::path::Path;
use zip::read::ZipArchive;

mod error;
mod ir;
mod parser;
#[cfg(test)]
mod testing;
mod transform;
mod translate;

use crate::error::Result;

fn read_boxed<T: Read>(mut reader: T) -> io::Result<Box<[u8]>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf.into_boxed_slice())
}

fn load_dir(out: &mut Vec<Box<[u8]>>, path: &Path) -> io::Result<()> {
    let pattern = path.join("**").join("*.class");
    let entries = glob(&pattern.to_string_lossy()).map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    for entry in entries {
        let path = entry.map_err(|err| err.into_error())?;
        debug!("loading {}", path.display());
        out.push(read_boxed(File::open(path)?)?);
    }
    Ok(())
}

fn load_input(out: &mut Vec<Box<[u8]>>, path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return load_dir(out, path);
    }
    let file = File::open(path)?;
    let ext = path.extension();
    if ext == Some("class".as_ref()) {
        out.push(read_boxed(file)?);
        return Ok(());
    }
    let mut zip = ZipArchive::new(file)?;
    for index in 0..zip.len() {
        let zfile = zip.by_index(index)?;
        if zfile.name().ends_with(".class") {
            debug!("loading {} from {}", zfile.name(), path.display());
            out.push(read_boxed(zfile)?);
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<transform::Config> {
    let ext = path.extension();
    if path.is_dir() || ext == Some("class".as_ref()) || ext == Some("jar".as_ref()) {
        return Ok(transform::Config::new(path.to_owned()));
    }
    let data = read_boxed(File::open(path)?)?;
    Ok(toml::from_slice(&data)?)
}

fn main() -> Result<()> {
    let matches = clap_app!(classtoil =>
        (@arg input: +required "Input class, jar, directory or config")
        (@arg output: "Output file name")
        (@arg isolate: --isolate "Keep translating after a class fails")
        (@arg classes: --classes "Dump parsed classes instead of the module")
        (@arg verbose: -v --verbose +multiple "Raise log verbosity")
    )
    .get_matches();
    let level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(level);
    let cfgname = matches
        .value_of_os("input")
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no input given"))?;
    let mut config = load_config(Path::new(cfgname))?;
    config.isolate |= matches.is_present("isolate");
    config.dump_classes |= matches.is_present("classes");
    let mut data = Vec::new();
    for name in &config.inputs {
        load_input(&mut data, name)?;
    }
    let output = transform::transform_files(data, config)?;
    match matches.value_of_os("output") {
        Some(path) => File::create(path)?.write_all(&output)?,
        None => io::stdout().write_all(&output)?,
    }
    Ok(())
}

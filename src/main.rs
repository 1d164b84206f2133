// --- ttrec: timetable recommender command line ---

use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ttrec::{Config, RawOptions, Recommender, Snapshot, SqliteStore, StoreError};

const USAGE: &str = "usage:
    ttrec import <snapshot.json>
    ttrec recommend <student_id> <options.json>";

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn import(cfg: &Config, snapshot_path: &Path) -> Result<(), Box<dyn Error>> {
    let snapshot = Snapshot::load(snapshot_path)?;
    let mut store = SqliteStore::open(&cfg.db_path)?;
    store.import_snapshot(&snapshot)?;
    info!(
        db = %cfg.db_path.display(),
        courses = snapshot.courses.len(),
        lectures = snapshot.lectures.len(),
        evaluations = snapshot.evaluations.len(),
        students = snapshot.students.len(),
        "catalog imported"
    );
    Ok(())
}

fn recommend(cfg: &Config, student_id: &str, options_path: &Path) -> Result<(), Box<dyn Error>> {
    let student_id: i64 = student_id
        .parse()
        .map_err(|_| format!("student id must be an integer, got {:?}", student_id))?;
    let raw: RawOptions = serde_json::from_str(&fs::read_to_string(options_path)?)?;

    let mut store = SqliteStore::open(&cfg.db_path)?;
    let student = store
        .student(student_id)?
        .ok_or(StoreError::Catalog(ttrec::CatalogError::UnknownStudent(student_id)))?;

    let created = Recommender::new(cfg.recommend.clone()).recommend(&mut store, &raw, &student)?;
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

fn main() -> ExitCode {
    enable_tracing();
    let cfg = Config::from_env();
    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["import", path] => import(&cfg, Path::new(path)),
        ["recommend", student, options] => recommend(&cfg, student, Path::new(options)),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

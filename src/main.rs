use wmic_process_json::{app, clean_logger};

fn main() {
    let res = app::run();
    clean_logger();
    if let Err(err) = res {
        eprintln!("Error: {err:#}");
        std::process::exit(app::exit_code(&err));
    }
}

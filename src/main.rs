use colored::Colorize;

fn main() {
    if let Err(e) = sop_engine::run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

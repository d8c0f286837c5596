use colored::Colorize;

pub(crate) fn print_help() {
    eprintln!(
        "\nUsage: {}
Tasks are run in the root of the repository.

Tasks:
all       Run every task below before sending a change for review
check     Check the library crates without std, then the workspace with std
clippy    Run cargo clippy with warnings denied
coverage  Generate an html and xml coverage report under target/
docs      Generate documentation
doctest   Run documentation tests
fmt       Run cargo fmt
test      Run tests with cargo nextest
help      Print this help message

Options:
Task specific cargo options can be passed after the task name, e.g.:
cargo xtask test -p smbios_discovery
cargo xtask docs --open
",
        "cargo xtask <task> [options]".bright_green()
    );
}

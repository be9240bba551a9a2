mod logging;
mod repl;

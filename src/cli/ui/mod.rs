pub mod prompts;
pub mod report;
pub mod status;

pub use prompts::{prompt_confirmation, prompt_options, prompt_text, prompt_value};
pub use report::{print_batch_report, print_optionset_list, print_options, print_summary};
pub use status::{ConsoleProgress, Spinner, StatusLine};

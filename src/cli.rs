use clap::Parser;

use crate::zip::ReaderOptions;

#[derive(Parser, Debug)]
#[command(name = "memzip")]
#[command(version)]
#[command(about = "Read ZIP archives from memory or over HTTP", long_about = None)]
#[command(after_help = "Examples:\n  \
  memzip data1.zip -x joe        extract all files except joe from data1.zip\n  \
  memzip -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  memzip -t -O sjis legacy.zip   test a Shift_JIS named archive\n  \
  memzip -l https://example.com/archive.zip   list files from remote ZIP")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely/show version info
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive files against their CRC32
    #[arg(short = 't')]
    pub test: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Character set of file names (detected when omitted)
    #[arg(short = 'O', value_name = "CHARSET")]
    pub charset: Option<String>,

    /// Inflate output chunk size in bytes
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Report progress while reading the archive headers
    #[arg(long)]
    pub progress: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Reader configuration selected by the command line
    pub fn reader_options(&self) -> ReaderOptions {
        let mut options = ReaderOptions::new();
        if let Some(charset) = &self.charset {
            options = options.with_encoding(charset.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            options = options.with_chunk_size(chunk_size);
        }
        if self.progress && !self.is_quiet() {
            options = options.with_progress(|p| eprintln!("Reading headers: {:>3}%", p.percent));
        }
        options
    }
}

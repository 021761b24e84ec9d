#[derive(Clone, Debug, PartialEq)]
pub enum RedirectInstruction {
    Input,
    Output,
}

impl RedirectInstruction {
    pub fn token(&self) -> &'static str {
        match *self {
            RedirectInstruction::Input => "<",
            RedirectInstruction::Output => ">",
        }
    }
}

/// A parsed command line.
///
/// The top-level command carries the whole line in `input` and the
/// background flag; a pipeline's second stage hangs off `pipeline`.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// Command text, used in job listings and messages.
    pub input: String,
    /// Program name followed by its arguments. Never empty.
    pub argv: Vec<String>,
    /// The name of the input file, if one is specified
    pub infile: Option<String>,
    /// The file to write stdout to, if one is specified
    pub outfile: Option<String>,
    /// Second stage of a two-stage pipeline.
    pub pipeline: Option<Box<Command>>,
    /// Run the command in the background, defaults to false
    pub background: bool,
}

impl Command {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn is_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }
}

/// Builds Commands.
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    input: String,
    argv: Vec<String>,
    infile: Option<String>,
    outfile: Option<String>,
    pipeline: Option<Box<Command>>,
    background: bool,
}

impl CommandBuilder {
    /// Construct a new `CommandBuilder` for the given command text, with the
    /// following default configuration:
    ///
    /// * No arguments
    /// * No input/output redirection
    /// * No pipeline
    /// * Runs in foreground
    pub fn new(input: &str) -> CommandBuilder {
        CommandBuilder {
            input: input.to_string(),
            argv: Vec::new(),
            infile: None,
            outfile: None,
            pipeline: None,
            background: false,
        }
    }

    /// Add an argument. The first one is the program.
    pub fn arg(&mut self, arg: &str) -> &mut CommandBuilder {
        self.argv.push(arg.to_string());
        self
    }

    pub fn args(&mut self, args: &[&str]) -> &mut CommandBuilder {
        self.argv.extend(args.iter().map(|arg| (*arg).to_string()));
        self
    }

    /// Add input redirection from the specified filename.
    pub fn infile(&mut self, filename: &str) -> &mut CommandBuilder {
        self.infile = Some(filename.to_string());
        self
    }

    /// Add output redirection to the specified filename.
    pub fn outfile(&mut self, filename: &str) -> &mut CommandBuilder {
        self.outfile = Some(filename.to_string());
        self
    }

    pub fn redirect(
        &mut self,
        instruction: &RedirectInstruction,
        filename: &str,
    ) -> &mut CommandBuilder {
        match *instruction {
            RedirectInstruction::Input => self.infile(filename),
            RedirectInstruction::Output => self.outfile(filename),
        }
    }

    /// Connect `command`'s standard input to this command's standard output.
    pub fn pipeline(&mut self, command: Command) -> &mut CommandBuilder {
        self.pipeline = Some(Box::new(command));
        self
    }

    /// Configure command to run in the background.
    pub fn background(&mut self, background: bool) -> &mut CommandBuilder {
        self.background = background;
        self
    }

    pub fn has_args(&self) -> bool {
        !self.argv.is_empty()
    }

    pub fn has_infile(&self) -> bool {
        self.infile.is_some()
    }

    pub fn has_outfile(&self) -> bool {
        self.outfile.is_some()
    }

    /// Build the final command.
    pub fn build(&self) -> Command {
        Command {
            input: self.input.clone(),
            argv: self.argv.clone(),
            infile: self.infile.clone(),
            outfile: self.outfile.clone(),
            pipeline: self.pipeline.clone(),
            background: self.background,
        }
    }
}

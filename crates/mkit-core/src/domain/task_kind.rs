//! TaskKind - the fixed catalogue of measurement tasks.
//!
//! Two faces of the same catalogue:
//! - **Typed**: one marker type per task implementing [`TaskDescriptor`].
//!   `TaskDescriptor::Input` decides whether the builder exposes `add_input`.
//! - **Runtime**: the [`TaskKind`] enum, for front ends that pick a task by name.

use std::fmt;
use std::str::FromStr;

/// Marker: the task takes no inputs.
#[derive(Debug, Clone, Copy)]
pub struct Inputless;

/// Marker: the task accepts `inputs` and `input_filepaths`.
#[derive(Debug, Clone, Copy)]
pub struct WithInput;

/// Input capability of a task kind. Sealed to the two markers above.
pub trait InputCapability: sealed::Sealed + Send + Sync + 'static {
    const ACCEPTS_INPUT: bool;
}

impl InputCapability for Inputless {
    const ACCEPTS_INPUT: bool = false;
}

impl InputCapability for WithInput {
    const ACCEPTS_INPUT: bool = true;
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Inputless {}
    impl Sealed for super::WithInput {}
}

/// TaskDescriptor ties a marker type to its catalogue entry.
///
/// # Example
/// ```ignore
/// let builder = WebConnectivity::builder(engine).add_input("https://a.example/");
/// ```
pub trait TaskDescriptor: Send + Sync + 'static {
    const KIND: TaskKind;
    type Input: InputCapability;
}

macro_rules! task_catalogue {
    ($( $name:ident => $input:ty ),+ $(,)?) => {
        /// Runtime tag for every task in the catalogue.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum TaskKind {
            $( $name, )+
        }

        impl TaskKind {
            pub const ALL: &'static [TaskKind] = &[ $( TaskKind::$name, )+ ];

            /// Name written into the settings document.
            pub fn name(self) -> &'static str {
                match self {
                    $( TaskKind::$name => stringify!($name), )+
                }
            }

            pub fn accepts_input(self) -> bool {
                match self {
                    $( TaskKind::$name => <$input as InputCapability>::ACCEPTS_INPUT, )+
                }
            }
        }

        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl TaskDescriptor for $name {
                const KIND: TaskKind = TaskKind::$name;
                type Input = $input;
            }
        )+
    };
}

task_catalogue! {
    Dash => Inputless,
    CaptivePortal => Inputless,
    DnsInjection => WithInput,
    FacebookMessenger => Inputless,
    HttpHeaderFieldManipulation => Inputless,
    HttpInvalidRequestLine => Inputless,
    MeekFrontedRequests => WithInput,
    MultiNdt => Inputless,
    Ndt => Inputless,
    TcpConnect => WithInput,
    Telegram => Inputless,
    WebConnectivity => WithInput,
    Whatsapp => Inputless,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task kind `{0}`")]
pub struct UnknownTaskKind(pub String);

impl FromStr for TaskKind {
    type Err = UnknownTaskKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownTaskKind(s.to_string()))
    }
}

//! The fixed hardware-documentation taxonomy and its ordered dispatch table.
//!
//! Rules are evaluated top to bottom and the first trigger phrase found in the
//! lower-cased element text wins. Trigger phrases overlap ("register" fires before
//! "memory map", "interface" before "hardware interface"), so the order of [`RULES`] is
//! part of the contract and mirrors the order of [`Category::ALL`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! taxonomy {
    ($( $variant:ident => $name:literal, $trigger:literal; )+) => {
        /// One bucket of the taxonomy. Declaration order is taxonomy order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Category {
            $( $variant, )+
        }

        impl Category {
            /// Every category, in taxonomy order.
            pub const ALL: &'static [Category] = &[ $( Category::$variant, )+ ];

            /// The key used for this category in a serialized summary.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Category::$variant => $name, )+
                }
            }
        }

        /// The ordered (category, trigger phrase) dispatch table.
        pub const RULES: &[Rule] = &[
            $( Rule { category: Category::$variant, trigger: $trigger }, )+
        ];
    };
}

taxonomy! {
    DeviceName => "device_name", "device name";
    Registers => "registers", "register";
    MemoryMap => "memory_map", "memory map";
    Interrupts => "interrupts", "interrupt";
    PowerManagement => "power_management", "power management";
    Interfaces => "interfaces", "interface";
    PinConfiguration => "pin_configuration", "pin configuration";
    TimingDiagrams => "timing_diagrams", "timing diagram";
    ElectricalCharacteristics => "electrical_characteristics", "electrical characteristic";
    OperatingConditions => "operating_conditions", "operating condition";
    PackageInformation => "package_information", "package information";
    ApplicationCircuits => "application_circuits", "application circuit";
    BootSequence => "boot_sequence", "boot sequence";
    InitializationCode => "initialization_code", "initialization code";
    DriverApi => "driver_api", "driver api";
    ErrorHandling => "error_handling", "error handling";
    SecurityFeatures => "security_features", "security feature";
    DebuggingFeatures => "debugging_features", "debugging feature";
    PerformanceMetrics => "performance_metrics", "performance metric";
    CompatibilityInformation => "compatibility_information", "compatibility information";
    FirmwareUpdates => "firmware_updates", "firmware update";
    PowerConsumption => "power_consumption", "power consumption";
    ThermalManagement => "thermal_management", "thermal management";
    SupportedProtocols => "supported_protocols", "supported protocol";
    ExampleUsage => "example_usage", "example usage";
    DocumentationReferences => "documentation_references", "documentation reference";
    CommunicationProtocols => "communication_protocols", "communication protocol";
    HardwareInterfaces => "hardware_interfaces", "hardware interface";
    MemoryManagement => "memory_management", "memory management";
    PowerModes => "power_modes", "power mode";
    ClockConfiguration => "clock_configuration", "clock configuration";
    ResetProcedures => "reset_procedures", "reset procedure";
    DiagnosticFeatures => "diagnostic_features", "diagnostic feature";
    SafetyFeatures => "safety_features", "safety feature";
    ComplianceStandards => "compliance_standards", "compliance standard";
    EnvironmentalConditions => "environmental_conditions", "environmental condition";
    LifecycleManagement => "lifecycle_management", "lifecycle management";
    TestingProcedures => "testing_procedures", "testing procedure";
    TroubleshootingGuides => "troubleshooting_guides", "troubleshooting guide";
    PerformanceBenchmarks => "performance_benchmarks", "performance benchmark";
    OptimizationTips => "optimization_tips", "optimization tip";
    KnownIssues => "known_issues", "known issue";
    Workarounds => "workarounds", "workaround";
    ReleaseNotes => "release_notes", "release note";
    ChangeLog => "change_log", "change log";
}

/// A single entry of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub category: Category,
    /// Lower-case phrase matched as a substring.
    pub trigger: &'static str,
}

impl Rule {
    /// `lowered` must already be lower-cased.
    pub fn matches(&self, lowered: &str) -> bool {
        lowered.contains(self.trigger)
    }
}

/// Category of the first rule whose trigger occurs in `text` (case-insensitive).
pub fn first_match(text: &str) -> Option<Category> {
    if text.trim().is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.category)
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown taxonomy category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

//! Compiled-in catalog dataset: six pump systems × 23 comparison dimensions.
//!
//! The detail text is reference data maintained alongside the scoring
//! tables; a production deployment can swap in a `JsonSource` snapshot
//! exported from the catalog administration subsystem instead.

use std::collections::BTreeMap;

use crate::catalog::{CatalogError, CatalogSource};
use crate::ids::DeviceId;
use crate::types::{CatalogData, Device, Dimension};

/// Canonical device order. Earlier wins score ties.
const DEVICES: [(&str, &str); 6] = [
    ("omnipod5", "Omnipod 5"),
    ("tslimx2", "Tandem t:slim X2"),
    ("mobi", "Tandem Mobi"),
    ("minimed780g", "Medtronic MiniMed 780G"),
    ("ilet", "Beta Bionics iLet"),
    ("twiist", "Twiist"),
];

struct DimensionSpec {
    number: u8,
    name: &'static str,
    category: &'static str,
    description: &'static str,
    /// Detail text per device, in canonical device order.
    details: [&'static str; 6],
}

const DIMENSIONS: [DimensionSpec; 23] = [
    DimensionSpec {
        number: 1,
        name: "Battery & power",
        category: "Hardware",
        description: "How the pump is powered and how often it needs attention.",
        details: [
            "Built into each disposable pod; never charged by the wearer.",
            "Rechargeable battery, tops up from any USB-C charger; a short daily charge is typical.",
            "Rechargeable with a wireless charging pad; very small cell, charged every few days.",
            "Replaceable AA lithium battery swapped roughly weekly.",
            "Rechargeable, inductive charging plate; multi-day runtime.",
            "Swappable rechargeable batteries; a spare can be rotated in without downtime.",
        ],
    },
    DimensionSpec {
        number: 2,
        name: "Phone control & bolusing",
        category: "Controls",
        description: "Whether insulin can be dosed from a phone app.",
        details: [
            "Full control from a compatible phone app or the provided controller.",
            "Bolus from the phone app; most other changes use the pump touchscreen.",
            "Designed around the phone: all programming and bolusing happen in the app.",
            "Phone app mirrors data; dosing is performed on the pump itself.",
            "Viewing on the phone; dosing interactions happen on the pump body.",
            "Bolus and adjustments from the phone, including a watch-based quick bolus.",
        ],
    },
    DimensionSpec {
        number: 3,
        name: "Tubing style",
        category: "Wear",
        description: "Tubed infusion set versus tubeless pod wear.",
        details: [
            "Tubeless pod adhered directly to the skin; no tubing at all.",
            "Traditional tubed infusion set, pump clipped or pocketed.",
            "Very short tube with a pump small enough to adhere on-body.",
            "Traditional tubed infusion set with a larger pump body.",
            "Tubed infusion set with a compact pump body.",
            "Short-tube design with a light circular pump worn on-body.",
        ],
    },
    DimensionSpec {
        number: 4,
        name: "Automation algorithm",
        category: "Algorithm",
        description: "How the hybrid closed loop doses and corrects.",
        details: [
            "Adapts basal each pod cycle from recent totals; corrects toward a fixed target.",
            "Adjusts basal and issues automatic correction boluses up to every five minutes.",
            "Runs the same automation as its touchscreen sibling, tuned for micro-dosing.",
            "Aggressive auto-corrections with an optional low fixed target for tight control.",
            "Fully autonomous dosing from body weight alone; no manual basal programming.",
            "Adjusts every few minutes using insulin-on-board plus meal announcements.",
        ],
    },
    DimensionSpec {
        number: 5,
        name: "CGM compatibility",
        category: "Integration",
        description: "Which glucose sensors the system pairs with.",
        details: [
            "Pairs with the major fingerstick-free sensors across two vendors.",
            "Works with current and prior generations of the leading sensor line.",
            "Pairs with the current leading sensor generation.",
            "Locked to the manufacturer's own sensor family.",
            "Pairs with the leading sensor line and one alternative vendor.",
            "Pairs with the leading sensor line; additional vendors on the roadmap.",
        ],
    },
    DimensionSpec {
        number: 6,
        name: "Target adjustability",
        category: "Algorithm",
        description: "How much the glucose target can be personalized.",
        details: [
            "Adjustable targets in small steps across the day.",
            "Multiple profiles with distinct targets, ratios and sensitivities.",
            "Same profile flexibility as its sibling, managed in the app.",
            "Fixed algorithm targets with a choice between two set points.",
            "Three coarse targets only; by design there is little to tune.",
            "Adjustable targets with schedule support in the app.",
        ],
    },
    DimensionSpec {
        number: 7,
        name: "Exercise handling",
        category: "Algorithm",
        description: "Raising targets or reducing insulin around activity.",
        details: [
            "Activity feature raises target and softens dosing for a chosen window.",
            "Dedicated exercise mode raises target; can be scheduled ahead.",
            "Exercise mode triggered from the phone app.",
            "Temp target raises the setpoint for workouts.",
            "Aerobic activity supported by removing the pump for up to an hour.",
            "Activity setting lowers insulin delivery around workouts.",
        ],
    },
    DimensionSpec {
        number: 8,
        name: "Bolus workflow",
        category: "Controls",
        description: "What a meal dose requires of the wearer.",
        details: [
            "Carb entry in the app with a built-in calculator and sensor correction.",
            "Carb entry on the touchscreen or phone; calculator handles corrections.",
            "Carb entry in the app; a button on the pump delivers a preset dose.",
            "Carb entry on the pump with auto-correction filling the gaps.",
            "No carb counting: announce a meal as small, usual or large.",
            "Carb or simplified meal entry in the app; watch quick-bolus supported.",
        ],
    },
    DimensionSpec {
        number: 9,
        name: "Reservoir capacity",
        category: "Hardware",
        description: "How much insulin is carried per fill.",
        details: [
            "Up to 200 units per pod, worn for up to three days.",
            "300-unit cartridge.",
            "200-unit cartridge in a much smaller body.",
            "300-unit reservoir.",
            "160-unit prefilled or self-filled cartridge.",
            "300-unit cassette.",
        ],
    },
    DimensionSpec {
        number: 10,
        name: "Adhesive & site tolerance",
        category: "Wear",
        description: "Skin burden of the wear style.",
        details: [
            "Whole device is adhesive-mounted; the full pod moves with each site change.",
            "Only the infusion set adheres; pump itself never touches skin.",
            "Either adhesive-mounted on-body or clipped with the set adhered.",
            "Only the infusion set adheres; larger set options available.",
            "Only the infusion set adheres.",
            "Light device adhered via a replaceable patch; low pull on skin.",
        ],
    },
    DimensionSpec {
        number: 11,
        name: "Water resistance",
        category: "Hardware",
        description: "Swimming, showering and submersion tolerance.",
        details: [
            "Waterproof pod; swim and shower without disconnecting.",
            "Watertight briefly but not rated for swimming; disconnect advised.",
            "Waterproof at shallow depth for up to an hour.",
            "Waterproof at depth when the case is undamaged.",
            "Water-resistant; remove for swimming.",
            "Splash-resistant; remove for submersion.",
        ],
    },
    DimensionSpec {
        number: 12,
        name: "Alerts & alarm customization",
        category: "Controls",
        description: "Tuning which alarms fire and how loudly.",
        details: [
            "App-managed alerts with adjustable urgency ladders.",
            "Granular alert profiles including quiet sleep settings.",
            "Alerts live on the phone with vibration on the pump body.",
            "Extensive alarm set; some safety alarms cannot be silenced.",
            "Deliberately minimal alert surface to reduce burden.",
            "Phone-first alerts with configurable thresholds.",
        ],
    },
    DimensionSpec {
        number: 13,
        name: "On-device interface",
        category: "Controls",
        description: "Screen and buttons on the pump itself.",
        details: [
            "No interface on the pod; everything lives in the app or controller.",
            "Large color touchscreen directly on the pump.",
            "No screen; one button for preset doses, the phone does the rest.",
            "Color screen with physical buttons.",
            "Small touchscreen with a simplified menu tree.",
            "Minimal on-device display; phone-centric by design.",
        ],
    },
    DimensionSpec {
        number: 14,
        name: "Data sharing & reports",
        category: "Integration",
        description: "Uploads, clinician dashboards and exports.",
        details: [
            "Automatic cloud upload viewable by the care team.",
            "Uploads to the vendor portal; widely supported by clinic software.",
            "Same portal as its sibling, synced from the phone.",
            "Vendor portal with detailed automation reports.",
            "Cloud reports emphasizing time-in-range summaries.",
            "App-based reports with clinician sharing links.",
        ],
    },
    DimensionSpec {
        number: 15,
        name: "Clinic familiarity & support",
        category: "Support",
        description: "How widely care teams know and train the system.",
        details: [
            "Very widely known; most endocrinology clinics train it routinely.",
            "Very widely known with mature training material.",
            "Newer, but supported by an established vendor's clinic network.",
            "Longest clinical track record of the group.",
            "Newer entrant; training is concentrated in specialty centers.",
            "Newest entrant with a growing support network.",
        ],
    },
    DimensionSpec {
        number: 16,
        name: "Travel & supply logistics",
        category: "Lifestyle",
        description: "Carrying supplies, spares and coping away from home.",
        details: [
            "Pods are self-contained; pack pods and insulin, nothing to recharge mid-trip.",
            "Charger plus infusion sets and cartridges; USB-C is easy to find.",
            "Charging pad plus sets and cartridges; very small footprint in a bag.",
            "AA batteries are available worldwide; bulkier supply kit.",
            "Charging plate plus sets; prefilled cartridges simplify packing.",
            "Spare battery swaps cover long travel days; cassettes and sets to pack.",
        ],
    },
    DimensionSpec {
        number: 17,
        name: "Caregiver & remote monitoring",
        category: "Integration",
        description: "Letting family or caregivers follow along remotely.",
        details: [
            "Companion app shows sensor and pod status to followers.",
            "Followers see sensor data and pump events in the companion app.",
            "Phone-first design extends naturally to follower views.",
            "Care partner app mirrors sensor values and alarms.",
            "Follower view covers glucose; dosing detail is intentionally sparse.",
            "Caregiver view includes remote bolus oversight.",
        ],
    },
    DimensionSpec {
        number: 18,
        name: "Discretion & visibility",
        category: "Lifestyle",
        description: "How noticeable the system is when worn.",
        details: [
            "Low-profile pod under clothing; no clipped device at the waist.",
            "Pocketed or clipped pump with visible tubing when dosing.",
            "Smallest footprint of the group; disappears under fitted clothing.",
            "Largest on-body presence; visible clip and tubing.",
            "Compact pump, modest pocket presence.",
            "Slim round body sits flat under clothing.",
        ],
    },
    DimensionSpec {
        number: 19,
        name: "Ecosystem & watch integration",
        category: "Integration",
        description: "Phone-platform depth and wearable control.",
        details: [
            "Solid apps on both phone platforms; watch shows status only.",
            "Both phone platforms for bolusing; watch notifications.",
            "Phone-required design, currently strongest on one platform.",
            "Status apps on both platforms; no phone dosing.",
            "Viewing apps only; the pump is the interface.",
            "Deep integration on one phone platform including watch bolusing.",
        ],
    },
    DimensionSpec {
        number: 20,
        name: "Occlusion & reliability handling",
        category: "Hardware",
        description: "Detecting blockages and recovering from faults.",
        details: [
            "Occlusion alarms on the pod; a fault means replacing the whole pod.",
            "Occlusion detection with site-change guidance; cartridge survives set swaps.",
            "Same detection stack in the smaller body.",
            "Conservative occlusion thresholds with detailed fault codes.",
            "Fault handling favors simple replace-and-continue steps.",
            "Occlusion detection with app-guided recovery.",
        ],
    },
    DimensionSpec {
        number: 21,
        name: "Cost & insurance pathway",
        category: "Lifestyle",
        description: "How the system is billed and replaced.",
        details: [
            "Pods often flow through the pharmacy benefit; low upfront commitment.",
            "Durable-equipment purchase with a multi-year warranty cycle.",
            "Durable-equipment purchase; newer entrant to formularies.",
            "Durable-equipment purchase with established payer relationships.",
            "Durable-equipment purchase; pharmacy options emerging.",
            "Subscription-style pharmacy model in many plans.",
        ],
    },
    DimensionSpec {
        number: 22,
        name: "On-body comfort & size",
        category: "Wear",
        description: "Weight and bulk as worn day to day.",
        details: [
            "Pod profile on the arm or abdomen; nothing at the waistband.",
            "Smartphone-sized body most wearers pocket or clip.",
            "About the size of two stacked coins; lightest tubed option.",
            "Heaviest and thickest body in the group.",
            "Compact rounded body, lighter than a phone.",
            "Very light circular body roughly the size of a sliced bagel half.",
        ],
    },
    DimensionSpec {
        number: 23,
        name: "Updates & upgradability",
        category: "Hardware",
        description: "Gaining new features without new hardware.",
        details: [
            "Pods iterate silently; app updates deliver features.",
            "Remote software updates have shipped whole new algorithms.",
            "App-driven updates inherited from its sibling platform.",
            "Feature updates typically arrive with new hardware generations.",
            "Cloud-pushed updates within the simplified feature set.",
            "App-store cadence; the platform is young and moving quickly.",
        ],
    },
];

/// Catalog source backed by the compiled-in dataset.
pub struct BuiltinSource;

impl CatalogSource for BuiltinSource {
    fn fetch(&self) -> Result<CatalogData, CatalogError> {
        let devices: Vec<Device> = DEVICES
            .iter()
            .map(|(id, name)| Device {
                id: DeviceId::new(*id),
                display_name: (*name).to_string(),
            })
            .collect();

        let dimensions = DIMENSIONS
            .iter()
            .map(|spec| {
                let mut details = BTreeMap::new();
                for (idx, (id, _)) in DEVICES.iter().enumerate() {
                    details.insert(DeviceId::new(*id), spec.details[idx].to_string());
                }
                Dimension {
                    number: spec.number,
                    name: spec.name.to_string(),
                    description: spec.description.to_string(),
                    category: spec.category.to_string(),
                    details,
                }
            })
            .collect();

        Ok(CatalogData {
            devices,
            dimensions,
        })
    }
}

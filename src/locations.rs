use serde::Serialize;

/// A selectable area and the EIC code ENTSO-E knows it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub eic: &'static str,
    pub name: &'static str,
}

const fn loc(eic: &'static str, name: &'static str) -> Location {
    Location { eic, name }
}

pub static BIDDING_ZONES: &[(&str, Location)] = &[
    ("AT", loc("10YAT-APG------L", "Austria")),
    ("BE", loc("10YBE----------2", "Belgium")),
    ("BG", loc("10YCA-BULGARIA-R", "Bulgaria")),
    ("CH", loc("10YCH-SWISSGRIDZ", "Switzerland")),
    ("CZ", loc("10YCZ-CEPS-----N", "Czech Republic")),
    ("DE", loc("10Y1001A1001A82H", "Germany-Luxembourg")),
    ("DK_1", loc("10YDK-1--------W", "Denmark DK1")),
    ("DK_2", loc("10YDK-2--------M", "Denmark DK2")),
    ("EE", loc("10Y1001A1001A39I", "Estonia")),
    ("ES", loc("10YES-REE------0", "Spain")),
    ("FI", loc("10YFI-1--------U", "Finland")),
    ("FR", loc("10YFR-RTE------C", "France")),
    ("GR", loc("10YGR-HTSO-----Y", "Greece")),
    ("HR", loc("10YHR-HEP------M", "Croatia")),
    ("HU", loc("10YHU-MAVIR----U", "Hungary")),
    ("IT_NORD", loc("10Y1001A1001A73I", "Italy North")),
    ("LT", loc("10YLT-1001A0008Q", "Lithuania")),
    ("LV", loc("10YLV-1001A00074", "Latvia")),
    ("NL", loc("10YNL----------L", "Netherlands")),
    ("NO_1", loc("10YNO-1--------2", "Norway NO1")),
    ("NO_2", loc("10YNO-2--------T", "Norway NO2")),
    ("NO_3", loc("10YNO-3--------J", "Norway NO3")),
    ("NO_4", loc("10YNO-4--------9", "Norway NO4")),
    ("NO_5", loc("10Y1001A1001A48H", "Norway NO5")),
    ("PL", loc("10YPL-AREA-----S", "Poland")),
    ("PT", loc("10YPT-REN------W", "Portugal")),
    ("RO", loc("10YRO-TEL------P", "Romania")),
    ("SE_1", loc("10Y1001A1001A44P", "Sweden SE1")),
    ("SE_2", loc("10Y1001A1001A45N", "Sweden SE2")),
    ("SE_3", loc("10Y1001A1001A46L", "Sweden SE3")),
    ("SE_4", loc("10Y1001A1001A47J", "Sweden SE4")),
    ("SI", loc("10YSI-ELES-----O", "Slovenia")),
    ("SK", loc("10YSK-SEPS-----K", "Slovakia")),
];

pub static COUNTRIES: &[(&str, Location)] = &[
    ("AT", loc("10YAT-APG------L", "Austria")),
    ("BE", loc("10YBE----------2", "Belgium")),
    ("BG", loc("10YCA-BULGARIA-R", "Bulgaria")),
    ("CH", loc("10YCH-SWISSGRIDZ", "Switzerland")),
    ("CZ", loc("10YCZ-CEPS-----N", "Czech Republic")),
    ("DE", loc("10Y1001A1001A83F", "Germany")),
    ("DK", loc("10Y1001A1001A65H", "Denmark")),
    ("EE", loc("10Y1001A1001A39I", "Estonia")),
    ("ES", loc("10YES-REE------0", "Spain")),
    ("FI", loc("10YFI-1--------U", "Finland")),
    ("FR", loc("10YFR-RTE------C", "France")),
    ("GR", loc("10YGR-HTSO-----Y", "Greece")),
    ("HR", loc("10YHR-HEP------M", "Croatia")),
    ("HU", loc("10YHU-MAVIR----U", "Hungary")),
    ("IT", loc("10YIT-GRTN-----B", "Italy")),
    ("LT", loc("10YLT-1001A0008Q", "Lithuania")),
    ("LU", loc("10YLU-CEGEDEL-NQ", "Luxembourg")),
    ("LV", loc("10YLV-1001A00074", "Latvia")),
    ("NL", loc("10YNL----------L", "Netherlands")),
    ("NO", loc("10YNO-0--------C", "Norway")),
    ("PL", loc("10YPL-AREA-----S", "Poland")),
    ("PT", loc("10YPT-REN------W", "Portugal")),
    ("RO", loc("10YRO-TEL------P", "Romania")),
    ("SE", loc("10YSE-1--------K", "Sweden")),
    ("SI", loc("10YSI-ELES-----O", "Slovenia")),
    ("SK", loc("10YSK-SEPS-----K", "Slovakia")),
];

pub static CONTROL_AREAS: &[(&str, Location)] = &[
    ("AT", loc("10YAT-APG------L", "APG")),
    ("BE", loc("10YBE----------2", "Elia")),
    ("CH", loc("10YCH-SWISSGRIDZ", "Swissgrid")),
    ("CZ", loc("10YCZ-CEPS-----N", "CEPS")),
    ("DE_50HZ", loc("10YDE-VE-------2", "50Hertz")),
    ("DE_AMPRION", loc("10YDE-RWENET---I", "Amprion")),
    ("DE_TENNET", loc("10YDE-EON------1", "TenneT GER")),
    ("DE_TRANSNET", loc("10YDE-ENBW-----N", "TransnetBW")),
    ("DK", loc("10Y1001A1001A796", "Energinet")),
    ("FR", loc("10YFR-RTE------C", "RTE")),
    ("NL", loc("10YNL----------L", "TenneT NL")),
    ("PL", loc("10YPL-AREA-----S", "PSE")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationType {
    BiddingZones,
    #[default]
    Countries,
    ControlAreas,
}

impl LocationType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bidding-zones" => Some(LocationType::BiddingZones),
            "countries" => Some(LocationType::Countries),
            "control-areas" => Some(LocationType::ControlAreas),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static [(&'static str, Location)] {
        match self {
            LocationType::BiddingZones => BIDDING_ZONES,
            LocationType::Countries => COUNTRIES,
            LocationType::ControlAreas => CONTROL_AREAS,
        }
    }

    pub fn lookup(&self, code: &str) -> Option<&'static Location> {
        self.table()
            .iter()
            .find(|(candidate, _)| *candidate == code)
            .map(|(_, location)| location)
    }
}

/// Substrings that mark a user agent as coming from a phone, tablet or other
/// handheld. Matched case-insensitively anywhere in the user-agent text by the
/// built-in `mobile` device.
pub const MOBILE_USER_AGENTS: &[&str] = &[
    "palm",
    "blackberry",
    "nokia",
    "phone",
    "midp",
    "mobi",
    "symbian",
    "chtml",
    "ericsson",
    "minimo",
    "audiovox",
    "motorola",
    "samsung",
    "telit",
    "upg1",
    "windows ce",
    "ucweb",
    "astel",
    "plucker",
    "x320",
    "x240",
    "j2me",
    "sgh",
    "portable",
    "sprint",
    "docomo",
    "kddi",
    "softbank",
    "android",
    "mmp",
    "pdxgw",
    "netfront",
    "xiino",
    "vodafone",
    "portalmmm",
    "sagem",
    "mot-",
    "sie-",
    "ipod",
    "up.b",
    "webos",
    "amoi",
    "novarra",
    "cdm",
    "alcatel",
    "pocket",
    "ipad",
    "iphone",
    "mobileexplorer",
    "mobile",
    "zune",
];

/// Configuration default values
///
/// Built-in curation lists used when no config file is present, kept in
/// one place so they are easy to change.
// Fetch defaults
pub const DEFAULT_USER_AGENT: &str = "iPlayTV/3.3.9";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// Output defaults
pub const DEFAULT_CONFIG_PATH: &str = "curator.toml";
pub const DEFAULT_OUTPUT_PATH: &str = "f1tv.m3u";

pub const DEFAULT_SOURCE_URLS: &[&str] = &[
    "https://github.com/mursor1985/LIVE/raw/refs/heads/main/iptv.m3u",
    "https://raw.githubusercontent.com/Kimentanm/aptv/master/m3u/iptv.m3u",
    "https://github.com/suxuang/myIPTV/raw/refs/heads/main/ipv6.m3u",
    "https://github.com/suxuang/myIPTV/raw/refs/heads/main/ipv4.m3u",
    "https://tv-1.iill.top/m3u/Gather",
    "https://tv-1.iill.top/m3u/Sport",
    "https://raw.githubusercontent.com/YueChan/Live/main/APTV.m3u",
    "https://raw.githubusercontent.com/fanmingming/live/main/tv/m3u/ipv6.m3u",
];

pub const DEFAULT_GUIDE_URLS: &[&str] = &[
    "https://11.112114.xyz/pp.xml",
    "https://epg.aptv.app/pp.xml.gz",
    "https://epg.aptv.app/xml",
    "https://live.fanmingming.cn/e.xml",
];

// (name, url)
pub const DEFAULT_STATIC_ENTRIES: &[(&str, &str)] =
    &[("五星体育", "https://cdn3.163189.xyz/163189/wxty")];

// (group, aliases)
pub const DEFAULT_GROUPS: &[(&str, &[&str])] = &[
    ("CCTV5+", &["CCTV5PLUS", "CCTV5p"]),
    ("Sky Sports F1", &["SkySportsF1"]),
];

// Literal targets, checked in order; earlier entries win
pub const DEFAULT_TARGETS: &[&str] = &[
    "五星体育",
    "广东体育",
    "CCTV5+",
    "CCTV5PLUS",
    "CCTV5p",
    "Sky Sports F1",
    "SkySportsF1",
    "CCTV5",
];

pub const DEFAULT_EXCLUSIONS: &[&str] = &["广播", "伴音"];

pub const DEFAULT_HARVEST_SOURCE_GUIDE_URLS: bool = true;

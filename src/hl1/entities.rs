//! Typed map entities and the closed name tables they dispatch through.
//!
//! Every classname the game ships is listed here; records with a classname
//! outside the table are reported as unknown. Only the handful of variants
//! the converter cares about parse into typed entities, the rest are known
//! and silently skipped.

use std::{collections::HashSet, sync::LazyLock};

use glam::IVec3;

/// Every retail classname, used to tell "known but irrelevant" apart from
/// "unknown" when reporting.
pub static KNOWN_CLASSNAMES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| CLASSNAME_NAMES.iter().copied().collect());

/// The closed parameter-name set; keys outside this set are warned about.
pub static KNOWN_PARAMETERS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| PARAMETER_NAMES.iter().copied().collect());

pub const PARAMETER_NAMES: [&str; 18] = [
    "classname",
    "targetname",
    "origin",
    "_light",
    "pattern",
    "style",
    "_fade",
    "angle",
    "pitch",
    "map",
    "landmark",
    "model",
    "message",
    "skyname",
    "chaptertitle",
    "gametitle",
    "newunit",
    "wad",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub origin: IVec3,
    pub color: [u8; 3],
    pub intensity: u32,
    pub fade: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightEnvironment {
    pub origin: IVec3,
    pub color: [u8; 3],
    pub intensity: u32,
    /// Degrees; negative aims the sun downwards.
    pub pitch: f32,
    /// Yaw, degrees.
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStart {
    pub origin: IVec3,
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub targetname: String,
    pub origin: IVec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLevel {
    pub map: String,
    pub landmark: String,
    /// Brush reference of the form `*N`.
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worldspawn {
    pub message: String,
    pub skyname: String,
    pub chaptertitle: String,
    /// `;`-separated WAD paths, with backslashes.
    pub wad: String,
    pub gametitle: bool,
    pub newunit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterKind {
    Scientist,
    Barney,
    Gman,
}

impl MonsterKind {
    /// Prefab name under `MOD/characters/`.
    pub fn prefab_name(self) -> &'static str {
        match self {
            Self::Scientist => "scientist",
            Self::Barney => "barney",
            Self::Gman => "gman",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    pub kind: MonsterKind,
    pub origin: IVec3,
    pub angle: f32,
}

/// One successfully dispatched entity record.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedEntity {
    Light(Light),
    LightEnvironment(LightEnvironment),
    PlayerStart(PlayerStart),
    Landmark(Landmark),
    ChangeLevel(ChangeLevel),
    Worldspawn(Worldspawn),
    Monster(Monster),
}

pub const CLASSNAME_NAMES: [&str; 196] = [
    "ambient_generic",
    "ammo_357",
    "ammo_9mmAR",
    "ammo_9mmbox",
    "ammo_9mmclip",
    "ammo_ARgrenades",
    "ammo_buckshot",
    "ammo_crossbow",
    "ammo_gaussclip",
    "ammo_rpgclip",
    "button_target",
    "cycler",
    "cycler_sprite",
    "cycler_wreckage",
    "cycler_weapon",
    "env_beam",
    "env_beverage",
    "env_blood",
    "env_bubbles",
    "env_explosion",
    "env_fade",
    "env_funnel",
    "env_glow",
    "env_global",
    "env_laser",
    "env_message",
    "env_rain",
    "env_render",
    "env_shake",
    "env_shooter",
    "env_smoker",
    "env_snow",
    "env_sound",
    "env_spark",
    "env_sprite",
    "env_fog",
    "func_breakable",
    "func_button",
    "func_conveyor",
    "func_door",
    "func_door_rotating",
    "func_friction",
    "func_guntarget",
    "func_healthcharger",
    "func_illusionary",
    "func_ladder",
    "func_monsterclip",
    "func_mortar_field",
    "func_pendulum",
    "func_plat",
    "func_platrot",
    "func_pushable",
    "func_recharge",
    "func_rot_button",
    "func_rotating",
    "func_tank",
    "func_tankcontrols",
    "func_tanklaser",
    "func_tankmortar",
    "func_tankrocket",
    "func_trackautochange",
    "func_trackchange",
    "func_tracktrain",
    "func_train",
    "func_traincontrols",
    "func_wall",
    "func_wall_toggle",
    "func_water",
    "game_counter",
    "game_counter_set",
    "game_end",
    "game_player_equip",
    "game_player_hurt",
    "game_player_team",
    "game_score",
    "game_team_master",
    "game_team_set",
    "game_text",
    "game_zone_player",
    "gibshooter",
    "info_bigmomma",
    "info_intermission",
    "info_landmark",
    "info_node",
    "info_node_air",
    "info_null",
    "info_player_coop",
    "info_player_deathmatch",
    "info_player_start",
    "info_target",
    "info_teleport_destination",
    "info_texlights",
    "infodecal",
    "item_airtank",
    "item_antidote",
    "item_battery",
    "item_healthkit",
    "item_longjump",
    "item_security",
    "item_suit",
    "world_items",
    "light",
    "light_environment",
    "light_spot",
    "momentary_door",
    "momentary_rot_button",
    "monster_alien_controller",
    "monster_alien_grunt",
    "monster_alien_slave",
    "monster_apache",
    "monster_barnacle",
    "monster_babycrab",
    "monster_barney",
    "monster_barney_dead",
    "monster_bigmomma",
    "monster_bullchicken",
    "monster_cockroach",
    "monster_flyer_flock",
    "monster_furniture",
    "monster_gargantua",
    "monster_generic",
    "monster_gman",
    "monster_grunt_repel",
    "monster_handgrenade",
    "monster_headcrab",
    "monster_hevsuit_dead",
    "monster_hgrunt_dead",
    "monster_houndeye",
    "monster_human_assassin",
    "monster_human_grunt",
    "monster_ichthyosaur",
    "monster_leech",
    "monster_miniturret",
    "monster_nihilanth",
    "monster_osprey",
    "monster_satchelcharge",
    "monster_scientist",
    "monster_scientist_dead",
    "monster_sentry",
    "monster_sitting_scientist",
    "monster_snark",
    "monster_tentacle",
    "monster_tripmine",
    "monster_turret",
    "monster_zombie",
    "monstermaker",
    "multi_manager",
    "multisource",
    "path_corner",
    "path_track",
    "player_loadsaved",
    "player_weaponstrip",
    "scripted_sentence",
    "scripted_sequence",
    "aiscripted_sequence",
    "speaker",
    "target_cdaudio",
    "trigger_auto",
    "trigger_autosave",
    "trigger_camera",
    "trigger_cdaudio",
    "trigger_changelevel",
    "trigger_changetarget",
    "trigger_counter",
    "trigger_endsection",
    "trigger_gravity",
    "trigger_hurt",
    "trigger_monsterjump",
    "trigger_multiple",
    "trigger_once",
    "trigger_push",
    "trigger_relay",
    "trigger_teleport",
    "trigger_transition",
    "weapon_357",
    "weapon_9mmAR",
    "weapon_9mmhandgun",
    "weapon_crossbow",
    "weapon_crowbar",
    "weapon_egon",
    "weapon_gauss",
    "weapon_handgrenade",
    "weapon_hornetgun",
    "weapon_rpg",
    "weapon_satchel",
    "weapon_shotgun",
    "weapon_snark",
    "weapon_tripmine",
    "weaponbox",
    "worldspawn",
    "xen_hair",
    "xen_plantlight",
    "xen_spore_large",
    "xen_spore_medium",
    "xen_spore_small",
    "xen_tree",
];

pub static EPISODE_COLUMN: &str = "Episode";
pub static TIMESTEP_COLUMN: &str = "Timestep";
pub static REPLAY_FILE_COLUMN: &str = "File";

pub static FRIENDLY_LABEL: &str = "Friendly";
pub static ENEMY_LABEL: &str = "Enemy";

pub static ALL_UNITS_GROUP: &str = "All";

/// Assigned to features whose value cannot be computed for an observation.
pub static UNDEFINED_FEATURE_VALUE: &str = "Undefined";
pub static TRUE_VALUE: &str = "True";
pub static FALSE_VALUE: &str = "False";

pub static MELEE_RANGE: &str = "melee";
pub static CLOSE_RANGE: &str = "close";
pub static FAR_RANGE: &str = "far";

pub static COMPACT: &str = "compact";
pub static SPREAD: &str = "spread";
pub static SCATTERED: &str = "scattered";

pub static LOW_ELEVATION: &str = "low";
pub static MEDIUM_ELEVATION: &str = "medium";
pub static HIGH_ELEVATION: &str = "high";

/// Number of order slots reported per unit by the engine.
pub static MAX_ORDERS: usize = 4;

pub static EPISODE_MARKER: &str = "ep";

pub static EPISODE_BREAKS_FILE: &str = "episodes.csv";
pub static FEATURE_DESCRIPTORS_FILE: &str = "feature-descriptors.json";
pub static CONFIG_FILE: &str = "config.json";
pub static RECORDED_REPLAY_EXTENSION: &str = "json";
pub static FEATURE_TABLE_EXTENSION: &str = "csv";

pub static QUEUE_CAPACITY_PER_WORKER: usize = 10;
pub static QUEUE_POLL_INTERVAL_MS: u64 = 100;

/// Qualified names of the StarCraft II unit types, as reported by the
/// engine's `unit_type` field.
pub static SC2_UNIT_TYPES: &[(&str, u32)] = &[
    ("Neutral.DestructibleDebris6x6", 365),
    ("Neutral.LabMineralField", 665),
    ("Neutral.LabMineralField750", 666),
    ("Neutral.MineralField", 341),
    ("Neutral.MineralField750", 483),
    ("Neutral.ProtossVespeneGeyser", 608),
    ("Neutral.PurifierVespeneGeyser", 880),
    ("Neutral.RichMineralField", 146),
    ("Neutral.RichMineralField750", 147),
    ("Neutral.RichVespeneGeyser", 344),
    ("Neutral.SpacePlatformGeyser", 343),
    ("Neutral.VespeneGeyser", 342),
    ("Neutral.XelNagaTower", 149),
    ("Protoss.Adept", 311),
    ("Protoss.Archon", 141),
    ("Protoss.Assimilator", 61),
    ("Protoss.Carrier", 79),
    ("Protoss.Colossus", 4),
    ("Protoss.CyberneticsCore", 72),
    ("Protoss.DarkShrine", 69),
    ("Protoss.DarkTemplar", 76),
    ("Protoss.Disruptor", 694),
    ("Protoss.FleetBeacon", 64),
    ("Protoss.Forge", 63),
    ("Protoss.Gateway", 62),
    ("Protoss.HighTemplar", 75),
    ("Protoss.Immortal", 83),
    ("Protoss.Interceptor", 85),
    ("Protoss.Mothership", 10),
    ("Protoss.Nexus", 59),
    ("Protoss.Observer", 82),
    ("Protoss.Oracle", 495),
    ("Protoss.Phoenix", 78),
    ("Protoss.PhotonCannon", 66),
    ("Protoss.Probe", 84),
    ("Protoss.Pylon", 60),
    ("Protoss.RoboticsBay", 70),
    ("Protoss.RoboticsFacility", 71),
    ("Protoss.Sentry", 77),
    ("Protoss.ShieldBattery", 1910),
    ("Protoss.Stalker", 74),
    ("Protoss.Stargate", 67),
    ("Protoss.Tempest", 496),
    ("Protoss.TemplarArchive", 68),
    ("Protoss.TwilightCouncil", 65),
    ("Protoss.VoidRay", 80),
    ("Protoss.WarpGate", 133),
    ("Protoss.WarpPrism", 81),
    ("Protoss.WarpPrismPhasing", 136),
    ("Protoss.Zealot", 73),
    ("Terran.Armory", 29),
    ("Terran.AutoTurret", 31),
    ("Terran.Banshee", 55),
    ("Terran.Barracks", 21),
    ("Terran.BarracksFlying", 46),
    ("Terran.BarracksReactor", 38),
    ("Terran.BarracksTechLab", 37),
    ("Terran.Battlecruiser", 57),
    ("Terran.Bunker", 24),
    ("Terran.CommandCenter", 18),
    ("Terran.CommandCenterFlying", 36),
    ("Terran.Cyclone", 692),
    ("Terran.EngineeringBay", 22),
    ("Terran.Factory", 27),
    ("Terran.FactoryFlying", 43),
    ("Terran.FactoryReactor", 40),
    ("Terran.FactoryTechLab", 39),
    ("Terran.FusionCore", 30),
    ("Terran.Ghost", 50),
    ("Terran.GhostAcademy", 26),
    ("Terran.Hellbat", 484),
    ("Terran.Hellion", 53),
    ("Terran.Liberator", 689),
    ("Terran.LiberatorAG", 734),
    ("Terran.MULE", 268),
    ("Terran.Marauder", 51),
    ("Terran.Marine", 48),
    ("Terran.Medivac", 54),
    ("Terran.MissileTurret", 23),
    ("Terran.OrbitalCommand", 132),
    ("Terran.OrbitalCommandFlying", 134),
    ("Terran.PlanetaryFortress", 130),
    ("Terran.PointDefenseDrone", 11),
    ("Terran.Raven", 56),
    ("Terran.Reactor", 6),
    ("Terran.Reaper", 49),
    ("Terran.Refinery", 20),
    ("Terran.SCV", 45),
    ("Terran.SensorTower", 25),
    ("Terran.SiegeTank", 33),
    ("Terran.SiegeTankSieged", 32),
    ("Terran.Starport", 28),
    ("Terran.StarportFlying", 44),
    ("Terran.StarportReactor", 42),
    ("Terran.StarportTechLab", 41),
    ("Terran.SupplyDepot", 19),
    ("Terran.SupplyDepotLowered", 47),
    ("Terran.TechLab", 5),
    ("Terran.Thor", 52),
    ("Terran.ThorHighImpactMode", 691),
    ("Terran.VikingAssault", 34),
    ("Terran.VikingFighter", 35),
    ("Terran.WidowMine", 498),
    ("Terran.WidowMineBurrowed", 500),
    ("Zerg.Baneling", 9),
    ("Zerg.BanelingBurrowed", 115),
    ("Zerg.BanelingCocoon", 8),
    ("Zerg.BanelingNest", 96),
    ("Zerg.BroodLord", 114),
    ("Zerg.Broodling", 289),
    ("Zerg.Changeling", 12),
    ("Zerg.Corruptor", 112),
    ("Zerg.CreepTumor", 87),
    ("Zerg.CreepTumorBurrowed", 137),
    ("Zerg.Drone", 104),
    ("Zerg.EvolutionChamber", 90),
    ("Zerg.Extractor", 88),
    ("Zerg.GreaterSpire", 102),
    ("Zerg.Hatchery", 86),
    ("Zerg.Hive", 101),
    ("Zerg.Hydralisk", 107),
    ("Zerg.HydraliskDen", 91),
    ("Zerg.InfestationPit", 94),
    ("Zerg.Infestor", 111),
    ("Zerg.Lair", 100),
    ("Zerg.Larva", 151),
    ("Zerg.Locust", 489),
    ("Zerg.Lurker", 502),
    ("Zerg.LurkerDen", 504),
    ("Zerg.Mutalisk", 108),
    ("Zerg.NydusCanal", 142),
    ("Zerg.NydusNetwork", 95),
    ("Zerg.Overlord", 106),
    ("Zerg.Overseer", 129),
    ("Zerg.Queen", 126),
    ("Zerg.Ravager", 688),
    ("Zerg.Roach", 110),
    ("Zerg.RoachWarren", 97),
    ("Zerg.SpawningPool", 89),
    ("Zerg.SpineCrawler", 98),
    ("Zerg.Spire", 92),
    ("Zerg.SporeCrawler", 99),
    ("Zerg.SwarmHost", 494),
    ("Zerg.Ultralisk", 109),
    ("Zerg.UltraliskCavern", 93),
    ("Zerg.Viper", 499),
    ("Zerg.Zergling", 105),
];

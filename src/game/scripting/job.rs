//! The `Job` global: a pure table of job-id constants so scripts can write
//! `Job.Warrior`, `Job.Fighter` and so on.

use mlua::Lua;

use orbis_game_common::data::Job;

const JOB_CONSTANTS: &[(&str, Job)] = &[
    ("Beginner", Job::Beginner),
    ("Warrior", Job::Swordsman),
    ("Swordsman", Job::Swordsman),
    ("Fighter", Job::Fighter),
    ("Crusader", Job::Crusader),
    ("Hero", Job::Hero),
    ("Page", Job::Page),
    ("WhiteKnight", Job::WhiteKnight),
    ("Paladin", Job::Paladin),
    ("Spearman", Job::Spearman),
    ("Berserker", Job::Berserker),
    ("DarkKnight", Job::DarkKnight),
    ("Magician", Job::Magician),
    ("FireWizard", Job::FireWizard),
    ("FireMage", Job::FireMage),
    ("FireArchMage", Job::FireArchMage),
    ("IceWizard", Job::IceWizard),
    ("IceMage", Job::IceMage),
    ("IceArchMage", Job::IceArchMage),
    ("Cleric", Job::Cleric),
    ("Priest", Job::Priest),
    ("Bishop", Job::Bishop),
    ("Archer", Job::Archer),
    ("Hunter", Job::Hunter),
    ("Ranger", Job::Ranger),
    ("BowMaster", Job::BowMaster),
    ("Crossbowman", Job::Crossbowman),
    ("Sniper", Job::Sniper),
    ("Marksman", Job::Marksman),
    ("Rogue", Job::Rogue),
    ("Assassin", Job::Assassin),
    ("Hermit", Job::Hermit),
    ("NightLord", Job::NightLord),
    ("Bandit", Job::Bandit),
    ("ChiefBandit", Job::ChiefBandit),
    ("Shadower", Job::Shadower),
    ("Pirate", Job::Pirate),
    ("Brawler", Job::Brawler),
    ("Marauder", Job::Marauder),
    ("Buccaneer", Job::Buccaneer),
    ("Gunslinger", Job::Gunslinger),
    ("Outlaw", Job::Outlaw),
    ("Corsair", Job::Corsair),
    ("Gm", Job::Gm),
    ("SuperGm", Job::SuperGm),
    ("Noblesse", Job::Noblesse),
    ("DawnWarrior", Job::DawnWarrior),
    ("BlazeWizard", Job::BlazeWizard),
    ("WindArcher", Job::WindArcher),
    ("NightWalker", Job::NightWalker),
    ("ThunderBreaker", Job::ThunderBreaker),
    ("Legend", Job::Legend),
    ("Evan", Job::Evan),
    ("Aran", Job::Aran),
];

pub fn register(lua: &Lua) -> mlua::Result<()> {
    let table = lua.create_table()?;
    for (name, job) in JOB_CONSTANTS {
        table.set(*name, job.id())?;
    }
    lua.globals().set("Job", table)
}

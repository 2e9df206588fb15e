//! Reply texts
//!
//! Everything the bot says, in one place. Formatting uses WhatsApp markup
//! (`*bold*`, `_italic_`).

use std::fmt::Write;

use super::stats::CommandStats;
use crate::config::BotConfig;
use crate::routes::{Route, RouteError, RouteField};

use super::commands::{ADD_ROUTE_USAGE, UPDATE_ROUTE_USAGE};

/// Users shown in the stats report
pub const TOP_USERS: usize = 5;

pub const ROUTE_ADDED: &str = "Rota adicionada com sucesso!";
pub const ROUTE_UPDATED: &str = "Rota atualizada com sucesso!";
pub const NOT_READY: &str =
    "❌ O bot ainda não está totalmente pronto. Aguarde alguns segundos e tente novamente.";
pub const GROUP_ONLY: &str = "❌ Este comando só funciona em grupos!";
pub const ADMIN_ONLY: &str = "❌ Apenas administradores podem usar este comando!";
pub const STATS_ADMIN_ONLY: &str = "❌ Apenas administradores podem ver as estatísticas!";
pub const NO_PARTICIPANTS: &str =
    "❌ Não foi possível obter a lista de participantes ou o grupo está vazio.";

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Full description of one route.
pub fn route_detail(route: &Route) -> String {
    let mut out = format!("*{} - {}*\n\n", route.key(), route.name);
    let bullets = [
        ("Ônibus", RouteField::Bus),
        ("Escolas", RouteField::Schools),
        ("Turno", RouteField::Shift),
        ("Monitor", RouteField::Monitor),
        ("Motorista", RouteField::Driver),
        ("Empresa", RouteField::Company),
        ("KM", RouteField::Distance),
        ("Placa", RouteField::Plate),
    ];
    for (label, field) in bullets {
        let _ = writeln!(out, "• {}: {}", label, or_na(route.get(field)));
    }
    if !route.start_date.trim().is_empty() {
        let _ = write!(out, "• Início: {}", route.start_date);
    }
    out
}

fn bullet_list<'a>(out: &mut String, routes: impl IntoIterator<Item = &'a Route>) {
    for route in routes {
        let _ = writeln!(out, "• {} - {}", route.key(), route.name);
    }
}

/// One line per route.
pub fn route_list(routes: &[Route]) -> String {
    if routes.is_empty() {
        return "Nenhuma rota cadastrada na planilha.".to_string();
    }
    let mut out = String::from("*Todas as Rotas:*\n\n");
    bullet_list(&mut out, routes);
    out
}

/// Result of a driver, monitor or company search.
pub fn search_results(field: RouteField, query: &str, routes: &[&Route]) -> String {
    let (title, none) = match field {
        RouteField::Driver => ("do motorista", "para este motorista"),
        RouteField::Monitor => ("do monitor", "para este monitor"),
        RouteField::Company => ("da empresa", "para esta empresa"),
        _ => ("com", "para esta busca"),
    };
    if routes.is_empty() {
        return format!("Nenhuma rota encontrada {}.", none);
    }
    let mut out = format!("*Rotas {} {}:*\n\n", title, query);
    bullet_list(&mut out, routes.iter().copied());
    out
}

/// `!rotas ajuda`
pub fn routes_help(config: &BotConfig) -> String {
    let p = &config.command_prefix;
    format!(
        "*Sistema de Gerenciamento de Rotas Escolares*\n\n\
         *Comandos de consulta:*\n\
         {p}rotas - Lista todas as rotas\n\
         {p}rota [número] - Informações de uma rota específica\n\
         {p}motorista [nome] - Rotas de um motorista\n\
         {p}monitor [nome] - Rotas de um monitor\n\
         {p}empresa [nome] - Rotas de uma empresa\n\n\
         *Comandos administrativos:*\n\
         {p}addrota [dados] - Adicionar nova rota\n\
         {p}updrota [dados] - Atualizar rota existente\n\n\
         *Formato para adicionar:*\n\
         {ADD_ROUTE_USAGE}\n\n\
         *Formato para atualizar:*\n\
         {UPDATE_ROUTE_USAGE}"
    )
}

/// General help. Admin-only commands are listed for admins only.
pub fn general_help(config: &BotConfig, is_admin: bool) -> String {
    let p = &config.command_prefix;
    let mut out = format!(
        "🤖 *Bot de Rotas - Comandos Disponíveis*\n\n📋 *Comandos Principais:*\n\
         • `{p}{}` - Mostra esta ajuda",
        config.help_command
    );
    if is_admin {
        let _ = write!(
            out,
            "\n• `{p}{}` - Mostra estatísticas de uso\
             \n• `{p}{}` - Menciona todos (invisível)\
             \n• `{p}{}` - Menciona todos (visível)",
            config.stats_command, config.mention_all_command, config.mention_all_visible_command
        );
    }

    let _ = write!(
        out,
        "\n\n📚 *Comandos de Rotas:*\
         \n• `{p}rotas ajuda` - Ajuda do sistema de rotas\
         \n• `{p}rotas` - Lista todas as rotas\
         \n• `{p}rota [número]` - Informações de uma rota\
         \n• `{p}motorista [nome]` - Rotas de um motorista\
         \n• `{p}monitor [nome]` - Rotas de um monitor\
         \n• `{p}empresa [nome]` - Rotas de uma empresa"
    );
    if is_admin {
        let _ = write!(
            out,
            "\n• `{p}addrota [dados]` - Adicionar nova rota\
             \n• `{p}updrota [dados]` - Atualizar rota existente"
        );
    }

    let _ = write!(
        out,
        "\n\nℹ️ *Informações:*\n• Limite: cada comando pode ser repetido a cada {} segundos",
        config.rate_limit_secs
    );
    if is_admin {
        out.push_str("\n• Você é um administrador e tem acesso a comandos especiais");
    }
    out
}

/// Usage report for admins.
pub fn stats_report(stats: &CommandStats, config: &BotConfig) -> String {
    let mut out = format!(
        "📊 *Estatísticas do Bot*\n\n• Total de comandos executados: {}\n\n📋 *Comandos por tipo:*\n",
        stats.total()
    );
    for (command, count) in stats.by_command() {
        let _ = writeln!(
            out,
            "• {}{}: {} vez(es)",
            config.command_prefix, command, count
        );
    }

    let _ = write!(out, "\n👥 *Usuários mais ativos (top {}):*\n", TOP_USERS);
    for (user_id, user) in stats.top_users(TOP_USERS) {
        let short_id = user_id.strip_suffix("@c.us").unwrap_or(user_id);
        let name = if user.name.trim().is_empty() {
            short_id
        } else {
            user.name.as_str()
        };
        let _ = writeln!(
            out,
            "• {}: {} comando(s), último: {}{} em {}",
            name,
            user.count,
            config.command_prefix,
            user.last_command,
            user.last_command_rfc3339()
        );
    }
    out
}

pub fn greeting(name: &str, config: &BotConfig) -> String {
    let name = if name.trim().is_empty() { "amigo" } else { name };
    format!(
        "Olá {}! 👋\n\nEu sou o bot de rotas escolares. Digite *{}{}* para ver os comandos disponíveis.",
        name, config.command_prefix, config.help_command
    )
}

pub fn how_to_use(config: &BotConfig) -> String {
    format!(
        "🤖 *Como usar o bot:*\n\n\
         1. Adicione o bot a um grupo\n\
         2. Digite *{}{}* para ver os comandos disponíveis\n\n\
         ⚠️ *Importante:* Alguns comandos funcionam apenas em grupos e exigem permissões de administrador!",
        config.command_prefix, config.help_command
    )
}

pub fn unknown_command(config: &BotConfig) -> String {
    format!(
        "❓ Comando não reconhecido. Use {}{} para ver os comandos disponíveis.",
        config.command_prefix, config.help_command
    )
}

pub fn rate_limited(seconds: u64) -> String {
    format!(
        "⏳ Aguarde {} segundos antes de usar este comando novamente.",
        seconds
    )
}

/// Message body of a visible mention: every member as `@<phone>`.
pub fn visible_mention(participants: &[String]) -> String {
    let mut out = String::from("📢 *Atenção pessoal!*\n\n");
    for id in participants {
        let phone = id.split('@').next().unwrap_or(id);
        let _ = write!(out, "@{} ", phone);
    }
    out.push_str("\n\n_Todos os membros foram mencionados._");
    out
}

pub fn visible_mention_sent(count: usize) -> String {
    format!("✅ Menção visível enviada para {} membros do grupo!", count)
}

/// User-facing text for a registry failure.
pub fn route_error(err: &RouteError) -> String {
    match err {
        RouteError::NotFound(_) => "Rota não encontrada!".to_string(),
        RouteError::DuplicateKey(_) => "Já existe uma rota com este número".to_string(),
        RouteError::PersistenceFailure(_) => "Erro ao salvar a planilha".to_string(),
        RouteError::FormatError(detail) => detail.clone(),
        RouteError::PermissionDenied => {
            "Você não tem permissão para executar este comando.".to_string()
        }
        RouteError::NotReady => {
            "A planilha ainda está sendo carregada. Tente novamente em alguns segundos.".to_string()
        }
    }
}
